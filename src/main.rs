use artmart_server::app;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    let _r = app::start().await;
    Ok(())
}
