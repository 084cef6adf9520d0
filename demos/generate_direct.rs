//! Build a document in code and submit it.
//!
//! Reads credentials from `$BOLETO_CONFIG` or `~/.config/boleto.toml`.

use boleto::client::*;
use boleto::core::*;
use chrono::{Days, Local};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_file(&ClientConfig::default_path()?)?;
    let session = Session::connect(config)?;

    let due = Local::now().date_naive() + Days::new(10);
    let request = DocumentRequestBuilder::new("BOL-DIRECT-001")
        .customer("João da Silva", "joao@email.com", "356.490.490-50")
        .address(
            AddressBuilder::new("Rua Exemplo", "123", "Centro", "São Paulo", "SP", "01234-567")
                .complement("Sala 45"),
        )
        .add_service("Consultoria", "Consultoria mensal", dec!(1500.50))
        .due_date(due)
        .interest(dec!(2.5))
        .fine(dec!(10))
        .email_notifications()
        .add_channel(ChannelKind::Sms, "+5511987654321", NotificationRule::ALL)
        .build()?;

    let generator = DocumentGenerator::new(session.clone());
    let doc = generator.submit(&request).await?;
    println!("id: {}", doc.id.as_deref().unwrap_or("-"));
    println!("status: {}", doc.status.as_deref().unwrap_or("-"));
    if let Some(line) = doc.digitable_line() {
        println!("digitable line: {line}");
    }
    if let Some(emv) = doc.pix_emv() {
        println!("PIX: {emv}");
    }

    if let Some(id) = doc.id.as_deref() {
        let paid = DocumentLookup::new(session).is_paid(id).await;
        println!("paid: {paid}");
    }
    Ok(())
}
