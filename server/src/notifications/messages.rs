use crate::models::{Purchase, User, Venue, VenueApplication};
use crate::notifications::Email;

pub fn booking_confirmation(purchase: &Purchase, venue: &Venue, customer: &User, qr_token: &str) -> Email {
    let body = format!(
        "Hello {name},\n\n\
         Your booking at {venue} is confirmed.\n\
         Visit date: {date}\n\
         Tickets: {quantity}\n\
         Total paid: ${total}\n\
         Booking reference: {reference}\n\n\
         Show this code at the entrance (it is printed as a QR code in the app):\n\
         {qr_token}\n\n\
         Thank you for your purchase!",
        name = customer.first_name,
        venue = venue.name,
        date = purchase.visit_date.format("%d/%m/%Y"),
        quantity = purchase.quantity,
        total = purchase.total,
        reference = purchase.id,
    );

    Email {
        to: customer.email.clone(),
        subject: format!("Your tickets for {}", venue.name),
        body,
    }
}

pub fn staff_welcome(user: &User, venue: &Venue) -> Email {
    let role = match user.role {
        crate::models::Role::VenueAdmin => "administrator",
        _ => "gate staff",
    };
    Email {
        to: user.email.clone(),
        subject: format!("Your {} account at {}", role, venue.name),
        body: format!(
            "Hello {name},\n\n\
             An account was created for you as {role} of {venue}.\n\
             Sign in with this email address and the password you were given.\n",
            name = user.first_name,
            venue = venue.name,
        ),
    }
}

pub fn application_approved(admin: &User, venue: &Venue) -> Email {
    Email {
        to: admin.email.clone(),
        subject: format!("{} is now listed", venue.name),
        body: format!(
            "Hello {name},\n\n\
             Your application for {venue} was approved and the venue is now listed.\n\
             Sign in again to manage it as the venue administrator.\n",
            name = admin.first_name,
            venue = venue.name,
        ),
    }
}

pub fn application_rejected(applicant: &User, application: &VenueApplication) -> Email {
    Email {
        to: applicant.email.clone(),
        subject: format!("Your application for {}", application.venue_name),
        body: format!(
            "Hello {name},\n\n\
             We could not approve your application for {venue}.\n\
             Reason: {reason}\n\n\
             You are welcome to apply again.\n",
            name = applicant.first_name,
            venue = application.venue_name,
            reason = application.rejection_reason.as_deref().unwrap_or("not given"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PurchaseStatus, Role, SubscriptionState};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn customer() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ana@example.cl".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            password_hash: String::new(),
            role: Role::Customer,
            venue_id: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn venue() -> Venue {
        Venue {
            id: Uuid::new_v4(),
            name: "Termas del Valle".to_string(),
            description: None,
            address: None,
            city: None,
            region: None,
            phone: None,
            email: None,
            subscription_state: SubscriptionState::Active,
            subscribed_on: None,
            plan_id: None,
            commission_percent: Decimal::new(5, 0),
            photo_limit: 5,
            daily_sales_limit: Some(100),
            payment_account_id: None,
            rating_average: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_booking_confirmation_mentions_token_and_date() {
        let venue = venue();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            venue_id: venue.id,
            visit_date: NaiveDate::from_ymd_opt(2024, 12, 24).unwrap(),
            quantity: 3,
            total: Decimal::new(45000, 0),
            status: PurchaseStatus::Paid,
            payment_id: Some("mp-1".to_string()),
            payer_email: None,
            amount_paid: Some(Decimal::new(45000, 0)),
            paid_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let email = booking_confirmation(&purchase, &venue, &customer(), "tok-123");
        assert_eq!(email.to, "ana@example.cl");
        assert!(email.subject.contains("Termas del Valle"));
        assert!(email.body.contains("24/12/2024"));
        assert!(email.body.contains("tok-123"));
    }

    #[test]
    fn test_staff_welcome_names_role() {
        let mut worker = customer();
        worker.role = Role::Worker;
        let email = staff_welcome(&worker, &venue());
        assert!(email.subject.contains("gate staff"));
    }

    #[test]
    fn test_application_emails() {
        let venue = venue();
        let approved = application_approved(&customer(), &venue);
        assert_eq!(approved.subject, "Termas del Valle is now listed");
        assert!(approved.body.contains("Sign in again"));

        let application = VenueApplication {
            id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            venue_name: "Termas del Valle".to_string(),
            description: None,
            company_tax_id: None,
            contact_email: "valle@termas.cl".to_string(),
            contact_phone: None,
            region: None,
            city: None,
            address: None,
            status: crate::models::ApplicationStatus::Rejected,
            rejection_reason: Some("Missing tax documents".to_string()),
            venue_id: None,
            submitted_at: Utc::now(),
            decided_at: Some(Utc::now()),
        };
        let rejected = application_rejected(&customer(), &application);
        assert!(rejected.body.contains("Reason: Missing tax documents"));
    }
}
