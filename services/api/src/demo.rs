use std::sync::Arc;

use clap::Args;
use kariah::config::{AppConfig, PaymentsConfig};
use kariah::error::AppError;
use kariah::session::{TenantId, UserId};
use kariah::telemetry;
use kariah::workflows::kariah::{
    ApplicationRepository, ApplicationSubmission, MembershipService,
};
use kariah::workflows::khairat::{ClaimService, ClaimSubmission};
use kariah::workflows::payments::{
    HttpPaymentGateway, PaymentProviderError, PaymentProviderService, ProviderCredentials,
    ProviderType,
};
use kariah::workflows::review::{ReviewCommand, ReviewDecision};

use crate::infra::{
    InMemoryApplicationRepository, InMemoryClaimRepository, InMemoryMembershipRepository,
    InMemoryProviderConfigRepository, LoggingNotificationPublisher,
};

#[derive(Args, Debug)]
pub(crate) struct ProviderTestArgs {
    /// billplz or toyyibpay
    #[arg(long)]
    pub(crate) provider: ProviderType,
    /// Use the provider's sandbox host
    #[arg(long)]
    pub(crate) sandbox: bool,
    #[arg(long)]
    pub(crate) api_key: Option<String>,
    #[arg(long)]
    pub(crate) collection_id: Option<String>,
    #[arg(long)]
    pub(crate) x_signature_key: Option<String>,
    #[arg(long)]
    pub(crate) secret_key: Option<String>,
    #[arg(long)]
    pub(crate) category_code: Option<String>,
}

impl ProviderTestArgs {
    fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            api_key: self.api_key.clone(),
            collection_id: self.collection_id.clone(),
            x_signature_key: self.x_signature_key.clone(),
            secret_key: self.secret_key.clone(),
            category_code: self.category_code.clone(),
        }
    }
}

pub(crate) async fn run_provider_test(args: ProviderTestArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = PaymentProviderService::new(
        Arc::new(InMemoryProviderConfigRepository::default()),
        Arc::new(HttpPaymentGateway::new(config.payments)?),
    );
    let report = service
        .test_connection(args.provider, &args.credentials(), args.sandbox)
        .await?;

    let mode = if report.is_sandbox { "sandbox" } else { "live" };
    println!(
        "{} ({mode}) accepted the credentials: {}",
        report.provider, report.detail
    );
    Ok(())
}

/// Values observed while walking through the membership scenario.
#[derive(Debug)]
pub(crate) struct MembershipWalkthrough {
    pub(crate) first_status: &'static str,
    pub(crate) reviewed_status: &'static str,
    pub(crate) reviewed_by: Option<UserId>,
    pub(crate) membership_status: &'static str,
    pub(crate) application_removed: bool,
    pub(crate) resubmitted_status: &'static str,
}

pub(crate) fn membership_walkthrough() -> Result<MembershipWalkthrough, AppError> {
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let service = MembershipService::new(
        applications.clone(),
        Arc::new(InMemoryMembershipRepository::default()),
        Arc::new(LoggingNotificationPublisher::default()),
    );
    let tenant = TenantId("M1".to_string());
    let user = UserId("user1".to_string());
    let admin = UserId("admin1".to_string());

    let submitted = service.submit(tenant.clone(), user.clone(), demo_application())?;
    println!(
        "- {} submitted {} for {} -> {}",
        user,
        submitted.id.0,
        tenant,
        submitted.status_view().status
    );

    let reviewed = service.review(ReviewCommand {
        id: submitted.id.clone(),
        tenant_id: tenant.clone(),
        decision: ReviewDecision::Approved,
        reviewer_id: admin,
        admin_notes: None,
        expected_version: Some(submitted.version),
    })?;
    let reviewed_view = reviewed.status_view();
    println!(
        "- reviewed by {} -> {}",
        reviewed_view
            .reviewed_by
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        reviewed_view.status
    );

    let membership_id = reviewed
        .membership_id
        .clone()
        .ok_or_else(|| AppError::Workflow("approval did not open a membership".into()))?;
    let withdrawn = service.withdraw(&membership_id, &user)?;
    let application_removed = applications.fetch(&submitted.id)?.is_none();
    println!(
        "- {} withdrew {} -> {} (application removed: {})",
        user,
        withdrawn.id.0,
        withdrawn.view().status,
        application_removed
    );

    let resubmitted = service.submit(tenant, user, demo_application())?;
    println!(
        "- resubmitted as {} -> {}",
        resubmitted.id.0,
        resubmitted.status_view().status
    );

    Ok(MembershipWalkthrough {
        first_status: submitted.status_view().status,
        reviewed_status: reviewed_view.status,
        reviewed_by: reviewed_view.reviewed_by,
        membership_status: withdrawn.view().status,
        application_removed,
        resubmitted_status: resubmitted.status_view().status,
    })
}

fn claim_walkthrough() -> Result<(), AppError> {
    let service = ClaimService::new(
        Arc::new(InMemoryClaimRepository::default()),
        Arc::new(LoggingNotificationPublisher::default()),
    );
    let tenant = TenantId("M1".to_string());
    let treasurer = UserId("admin1".to_string());

    let claim = service.submit(
        tenant.clone(),
        UserId("user1".to_string()),
        ClaimSubmission {
            deceased_name: "Hajah Aminah binti Yusof".to_string(),
            relationship: "mother".to_string(),
            amount_sen: 150_000,
            description: Some("Funeral and burial expenses".to_string()),
        },
    )?;
    println!(
        "- claim {} for RM{}.{:02} -> {}",
        claim.id.0,
        claim.amount_sen / 100,
        claim.amount_sen % 100,
        claim.status_view().status
    );

    let unnoted = service.review(ReviewCommand {
        id: claim.id.clone(),
        tenant_id: tenant.clone(),
        decision: ReviewDecision::Rejected,
        reviewer_id: treasurer.clone(),
        admin_notes: None,
        expected_version: None,
    });
    if let Err(err) = unnoted {
        println!("- rejection without notes refused: {err}");
    }

    let approved = service.review(ReviewCommand {
        id: claim.id.clone(),
        tenant_id: tenant.clone(),
        decision: ReviewDecision::Approved,
        reviewer_id: treasurer.clone(),
        admin_notes: Some("Death certificate verified".to_string()),
        expected_version: None,
    })?;
    println!("- approved -> {}", approved.status_view().status);

    let paid = service.mark_paid(&claim.id, &tenant, &treasurer)?;
    println!("- paid out -> {}", paid.status_view().status);
    Ok(())
}

async fn provider_walkthrough() -> Result<(), AppError> {
    let service = PaymentProviderService::new(
        Arc::new(InMemoryProviderConfigRepository::default()),
        Arc::new(HttpPaymentGateway::new(PaymentsConfig::default())?),
    );
    let incomplete = ProviderCredentials {
        secret_key: Some(String::new()),
        category_code: Some("X".to_string()),
        ..ProviderCredentials::default()
    };

    match service
        .validate_and_activate(
            TenantId("mosqueA".to_string()),
            ProviderType::Toyyibpay,
            &incomplete,
            true,
        )
        .await
    {
        Err(PaymentProviderError::Validation(err)) => {
            println!("- toyyibpay activation refused before contacting the gateway: {err}");
            Ok(())
        }
        Err(other) => Err(other.into()),
        Ok(_) => Err(AppError::Workflow(
            "incomplete toyyibpay credentials were accepted".into(),
        )),
    }
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    println!("Kariah administration demo");

    println!("\nKariah membership");
    membership_walkthrough()?;

    println!("\nKhairat claim");
    claim_walkthrough()?;

    println!("\nPayment providers");
    provider_walkthrough().await?;

    Ok(())
}

fn demo_application() -> ApplicationSubmission {
    ApplicationSubmission {
        full_name: "Ahmad bin Ismail".to_string(),
        ic_number: "900101-01-1234".to_string(),
        phone: "+60123456789".to_string(),
        address: "12 Jalan Masjid, Kampung Baru, Kuala Lumpur".to_string(),
        occupation: Some("Teacher".to_string()),
        dependents: 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_walkthrough_matches_expected_states() {
        let walkthrough = membership_walkthrough().expect("scenario runs");

        assert_eq!(walkthrough.first_status, "pending");
        assert_eq!(walkthrough.reviewed_status, "approved");
        assert_eq!(walkthrough.reviewed_by, Some(UserId("admin1".to_string())));
        assert_eq!(walkthrough.membership_status, "withdrawn");
        assert!(walkthrough.application_removed);
        assert_eq!(walkthrough.resubmitted_status, "pending");
    }

    #[test]
    fn claim_walkthrough_completes() {
        claim_walkthrough().expect("claim scenario runs");
    }

    #[tokio::test]
    async fn provider_walkthrough_stops_at_validation() {
        provider_walkthrough().await.expect("validation short-circuits");
    }
}
