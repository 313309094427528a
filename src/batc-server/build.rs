fn main() {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    println!("cargo:rustc-env=BATC_SERVER_BUILD_DATE={date}");
}
