use mypos_rust::SignatureVerifier;

fn main() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

    let secret = b"webhook-secret";
    let verifier = SignatureVerifier::new();

    // What myPOS would send along with a notification
    let payload = br#"{"event": "payment_received", "data": {"amount": 12.5, "currency": "EUR"}}"#;
    let header = verifier.sign(payload, secret, chrono::Utc::now().timestamp());
    tracing::info!("Signature header: {}", header);

    // Whitespace after separators does not change the signature
    let reformatted = br#"{"event":"payment_received","data":{"amount":12.5,"currency":"EUR"}}"#;
    tracing::info!(
        "Reformatted payload valid: {}",
        verifier.verify(reformatted, Some(&header), secret)
    );

    let tampered = br#"{"event": "payment_received", "data": {"amount": 99.0, "currency": "EUR"}}"#;
    tracing::info!(
        "Tampered payload valid: {}",
        verifier.verify(tampered, Some(&header), secret)
    );

    tracing::info!(
        "Wrong secret valid: {}",
        verifier.verify(payload, Some(&header), b"not-the-secret")
    );
}
