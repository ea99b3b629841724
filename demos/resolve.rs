use dnsflight::{AddressFamily, Client, ClientConfig};

#[tokio::main]
pub async fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("dnsflight=debug");
    builder.init();

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "example.com".to_owned());
    let client = Client::new(ClientConfig::default());

    match client.resolve4(&name).await {
        Ok(addresses) => println!("A     {:?}", addresses),
        Err(err) => println!("A     error: {}", err),
    }
    match client.resolve6(&name).await {
        Ok(addresses) => println!("AAAA  {:?}", addresses),
        Err(err) => println!("AAAA  error: {}", err),
    }
    match client.resolve_mx(&name).await {
        Ok(records) => {
            for mx in records {
                println!("MX    {} {}", mx.priority, mx.exchange);
            }
        }
        Err(err) => println!("MX    error: {}", err),
    }
    match client.resolve_txt(&name).await {
        Ok(records) => {
            for txt in records {
                println!("TXT   {:?}", txt);
            }
        }
        Err(err) => println!("TXT   error: {}", err),
    }
    match client.lookup(&name, AddressFamily::Inet).await {
        Ok(address) => println!("first {:?}", address),
        Err(err) => println!("first error: {}", err),
    }
}
