use std::net::{Ipv4Addr, SocketAddr};

use dnsflight::dns_parser::{Message, RRData, ResourceRecord, Type};
use dnsflight::Server;

#[tokio::main]
pub async fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("dnsflight=trace");
    builder.init();

    let addr: SocketAddr = "127.0.0.1:5353".parse().unwrap();
    let (server, handle) = Server::bind(
        addr,
        |query: &Message, response: &mut Message, _from: SocketAddr| {
            for question in &query.questions {
                if question.qtype == Type::A {
                    response.answers.push(ResourceRecord::new(
                        question.qname.clone(),
                        600,
                        RRData::A(Ipv4Addr::LOCALHOST),
                    ));
                }
            }
        },
    )
    .unwrap();

    println!("answering A queries on {}", handle.local_addr());
    // keep the handle alive; dropping it stops the server
    let _handle = handle;
    server.await;
}
