#[actix_web::main]
async fn main() {
    if let Err(err) = sales_analytics_lib::run().await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
