//! Request signing demo
//!
//! Prints the headers and a curl command for a signed `POST /api/values/postcity`.
//! Run the server with `HMAC_CREDENTIALS=alice:s3cr3t`, then:
//!
//! ```
//! cargo run --example sign_request
//! ```

use hmac_gate::{CanonicalMessageBuilder, RequestParameters, RequestSigner};

fn main() {
    let username = std::env::var("DEMO_USER").unwrap_or_else(|_| "alice".to_string());
    let secret = std::env::var("DEMO_SECRET").unwrap_or_else(|_| "s3cr3t".to_string());
    let path = "/api/values/postcity";

    let parameters = RequestParameters {
        form: vec![
            ("IcaoCode".to_string(), "ZPWS".to_string()),
            ("CityShortName".to_string(), "文山".to_string()),
        ],
        ..Default::default()
    };

    let headers = match RequestSigner::new(&username, &secret).sign_now("POST", path, &parameters) {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("failed to sign request: {e}");
            std::process::exit(1);
        }
    };

    let message = CanonicalMessageBuilder::new().compose("POST", &headers.timestamp, path, &parameters);

    println!("Canonical message:");
    for line in message.as_str().lines() {
        println!("  {line}");
    }

    println!("\nHeaders:");
    println!("  Timestamp: {}", headers.timestamp);
    println!("  Authentication: {}", headers.authentication);

    println!("\nExample curl command:");
    println!("curl -X POST \\");
    println!("     -H 'Timestamp: {}' \\", headers.timestamp);
    println!("     -H 'Authentication: {}' \\", headers.authentication);
    println!("     --data-urlencode 'IcaoCode=ZPWS' \\");
    println!("     --data-urlencode 'CityShortName=文山' \\");
    println!("     http://localhost:8080{path}");
    println!("\nThe signature is accepted once; a second identical request gets 401.");
}
