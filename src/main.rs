#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = histsync::cli::run(std::env::args()).await {
        eprintln!("histsync: {}", err);
        std::process::exit(1);
    }
}
