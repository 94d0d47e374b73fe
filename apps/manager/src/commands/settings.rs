//! # Settings Commands
//!
//! The settings page: global pricing template, business profile and
//! notification preferences. The receiving bank account is configuration
//! and read-only here.

use tracing::info;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::validation::{validate_amount, validate_business_profile};
use nhatro_core::{BusinessProfile, NotificationPreferences, PricingTemplate};
use nhatro_gateway::BankAccount;

pub async fn get_pricing_template(db: &DbState) -> Result<PricingTemplate, ApiError> {
    Ok(db.inner().settings().pricing_template().await?)
}

/// New rates apply to draft sessions started afterwards.
pub async fn update_pricing_template(
    db: &DbState,
    template: PricingTemplate,
) -> Result<PricingTemplate, ApiError> {
    validate_amount("electricity rate", template.electricity_rate)?;
    validate_amount("water rate", template.water_rate)?;
    validate_amount("wifi fee", template.wifi_fee)?;
    validate_amount("trash fee", template.trash_fee)?;
    validate_amount("parking fee", template.parking_fee)?;

    db.inner().settings().set_pricing_template(&template).await?;
    info!(
        electricity = %template.electricity_rate,
        water = %template.water_rate,
        "Pricing template updated"
    );
    Ok(template)
}

pub async fn get_business_profile(db: &DbState) -> Result<BusinessProfile, ApiError> {
    Ok(db.inner().settings().business_profile().await?)
}

pub async fn update_business_profile(
    db: &DbState,
    profile: BusinessProfile,
) -> Result<BusinessProfile, ApiError> {
    validate_business_profile(&profile)?;

    let profile = BusinessProfile {
        name: profile.name.trim().to_string(),
        phone: profile.phone.trim().to_string(),
        address: profile.address.trim().to_string(),
        email: profile.email.trim().to_string(),
    };
    db.inner().settings().set_business_profile(&profile).await?;
    info!(name = %profile.name, "Business profile updated");
    Ok(profile)
}

pub async fn get_notification_preferences(db: &DbState) -> Result<NotificationPreferences, ApiError> {
    Ok(db.inner().settings().notification_preferences().await?)
}

pub async fn update_notification_preferences(
    db: &DbState,
    prefs: NotificationPreferences,
) -> Result<NotificationPreferences, ApiError> {
    db.inner().settings().set_notification_preferences(&prefs).await?;
    Ok(prefs)
}

pub fn get_bank_account(config: &ConfigState) -> BankAccount {
    config.bank.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bulk::{get_draft_detail, initialize_drafts};
    use crate::commands::test_support::fixture;
    use crate::error::ErrorCode;
    use nhatro_core::Dong;

    #[tokio::test]
    async fn test_pricing_template_feeds_new_sessions() {
        let fx = fixture().await;
        let mut template = get_pricing_template(&fx.db).await.unwrap();
        template.electricity_rate = Dong::new(4_000);
        update_pricing_template(&fx.db, template).await.unwrap();
        assert_eq!(get_pricing_template(&fx.db).await.unwrap(), template);

        let overview = initialize_drafts(&fx.db, &fx.drafts, "2025-05".parse().unwrap(), None, None)
            .await
            .unwrap();
        let rooms = fx.db.inner().rooms().list_occupied().await.unwrap();
        let standard = rooms.iter().find(|r| !r.pricing(&template).is_custom).unwrap();
        let detail = get_draft_detail(&fx.db, &fx.drafts, &fx.config, standard.id)
            .await
            .unwrap();
        assert!(overview.rows.iter().any(|r| r.room_id == standard.id));
        assert_eq!(detail.pricing.electricity_rate, Dong::new(4_000));
    }

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let fx = fixture().await;
        let template = PricingTemplate {
            trash_fee: Dong::new(-1),
            ..PricingTemplate::default()
        };
        let err = update_pricing_template(&fx.db, template).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_business_profile() {
        let fx = fixture().await;
        let saved = update_business_profile(
            &fx.db,
            BusinessProfile {
                name: "  Nhà Trọ Bình An ".into(),
                phone: "0912345678".into(),
                address: "45 Lê Lợi".into(),
                email: "".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(saved.name, "Nhà Trọ Bình An");
        assert_eq!(get_business_profile(&fx.db).await.unwrap(), saved);

        let bad = BusinessProfile {
            email: "not-an-email".into(),
            ..saved
        };
        let err = update_business_profile(&fx.db, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_notification_preferences_and_bank() {
        let fx = fixture().await;
        let prefs = NotificationPreferences {
            daily_email_report: true,
            ..get_notification_preferences(&fx.db).await.unwrap()
        };
        update_notification_preferences(&fx.db, prefs).await.unwrap();
        assert!(get_notification_preferences(&fx.db).await.unwrap().daily_email_report);

        assert_eq!(get_bank_account(&fx.config), BankAccount::default());
    }
}
