//! Save a special rate for a property's condominium fee, then try to replace it.
//!
//! Run with: `cargo run --example special_rate --features workflow`

use async_trait::async_trait;
use cobranza::core::*;
use cobranza::special::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

/// Prints recalculation requests instead of sending them.
struct PrintRecalculator;

#[async_trait]
impl InvoiceRecalculator for PrintRecalculator {
    async fn recalculate(&self, request: &RecalculationRequest) -> Result<(), CobranzaError> {
        println!(
            "recalculate invoice {}: rate={:?} tax={:?} area={}",
            request.invoice_id, request.special_base_rate, request.tax_fraction, request.property_area
        );
        Ok(())
    }
}

fn request(rate: rust_decimal::Decimal, tax: rust_decimal::Decimal) -> SaveRequest {
    SaveRequest {
        key: ConfigurationKey::new(10, 20, 1),
        invoice_id: 501,
        form: ConfigurationForm {
            special_rate_enabled: true,
            special_base_rate: Some(rate),
            tax_enabled: true,
            tax_percentage: Some(tax),
            notes: Some("Acuerdo de junta, marzo".into()),
            invoice_only: false,
        },
        property: PropertyBuilder::new(10, "Torre B-101", dec!(200)).build(),
        service: ServiceBuilder::new(1, "ALIC", dec!(5))
            .name("Alícuota")
            .unit("m2")
            .tax(dec!(12))
            .build(),
    }
}

#[tokio::main]
async fn main() -> Result<(), CobranzaError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let service = ConfigurationService::new(InMemoryConfigurationStore::new(), PrintRecalculator);

    if let SaveOutcome::Saved(saved) = service
        .save_configuration(request(dec!(3.5), dec!(15)), false)
        .await?
    {
        println!(
            "saved configuration {:?}: subtotal={} tax={} total={}",
            saved.configuration_id, saved.charge.subtotal, saved.charge.tax, saved.charge.total
        );
    }

    match service.propose(request(dec!(4), dec!(12))).await? {
        Proposal::ConfirmationRequired {
            existing,
            token,
            request,
        } => {
            println!("configuration {} already active, replacing it", existing.id);
            let saved = service.confirm(request, Some(&token)).await?;
            println!("new total {}", saved.charge.total);
        }
        Proposal::Ready(request) => {
            service.confirm(request, None).await?;
        }
    }

    Ok(())
}
