use radius_proto::{
    sign_request, verify_response_authenticator, Attribute, AttributeType, Code, ErrorCause,
    Packet,
};
use std::net::UdpSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!(
            "Usage: {} <disconnect|coa> <session-id> <secret> [filter-id] [server_addr]",
            args[0]
        );
        eprintln!("Example: {} coa sess-42 testing123 throttle-1m 127.0.0.1:3799", args[0]);
        std::process::exit(1);
    }

    let code = match args[1].as_str() {
        "disconnect" => Code::DisconnectRequest,
        "coa" => Code::CoaRequest,
        other => {
            eprintln!("Unknown request type: {}", other);
            std::process::exit(1);
        }
    };
    let session_id = &args[2];
    let secret = args[3].as_bytes();
    let filter_id = args.get(4).filter(|f| !f.is_empty());
    let server_addr = args.get(5).map(|s| s.as_str()).unwrap_or("127.0.0.1:3799");

    println!("RADIUS CoA Client Test");
    println!("======================");
    println!("Server: {}", server_addr);
    println!("Request: {:?}", code);
    println!("Session: {}", session_id);
    println!();

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;

    let identifier = std::process::id() as u8;
    let mut packet = Packet::new(code, identifier, [0u8; 16]);
    packet.add_attribute(Attribute::string(
        AttributeType::AcctSessionId as u8,
        session_id.as_str(),
    )?);
    if let (Code::CoaRequest, Some(filter_id)) = (code, filter_id) {
        packet.add_attribute(Attribute::string(
            AttributeType::FilterId as u8,
            filter_id.as_str(),
        )?);
    }
    sign_request(&mut packet, secret)?;

    let request_data = packet.encode()?;
    println!("Sending {:?} ({} bytes)...", code, request_data.len());
    socket.send(&request_data)?;

    let mut buffer = vec![0u8; Packet::MAX_PACKET_SIZE];
    socket.set_read_timeout(Some(std::time::Duration::from_secs(5)))?;

    match socket.recv(&mut buffer) {
        Ok(len) => {
            let response = Packet::decode(&buffer[..len])?;
            println!("Received {:?} ({} bytes)", response.code, len);

            if response.identifier != identifier {
                println!("  Warning: identifier mismatch ({})", response.identifier);
            }
            if !verify_response_authenticator(&response, &packet.authenticator, secret) {
                println!("  Warning: Response Authenticator does not verify");
            }
            if let Some(cause) = response
                .find_attribute(AttributeType::ErrorCause as u8)
                .and_then(|attr| ErrorCause::from_attribute(attr).ok())
            {
                let class = if cause.is_client_error() {
                    "do not retry unchanged"
                } else if cause.is_server_error() {
                    "server side, may retry later"
                } else {
                    "informational"
                };
                println!("  Error-Cause: {:?} ({}, {})", cause, cause.as_u32(), class);
            }

            match response.code {
                Code::DisconnectAck | Code::CoaAck => println!("\n✓ Request acknowledged"),
                _ => println!("\n✗ Request refused"),
            }
        }
        Err(e) => {
            eprintln!("\n✗ No response: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
