//! Recurring background jobs.
//!
//! Overdue detection, cleanup of rentals whose power bank never left the
//! station, and referral expiry. Call `spawn_all` once during startup.

use crate::config::TasksConfig;
use crate::services::{ReferralService, RentalService};
use std::time::Duration;

/// Spawn all background tasks. Every job is safe to re-run and does not block
/// the caller.
pub fn spawn_all(
    rental_service: RentalService,
    referral_service: ReferralService,
    config: TasksConfig,
) {
    let overdue_interval = Duration::from_secs(config.overdue_check_interval_secs.max(1));

    // ACTIVE rentals past due become OVERDUE
    {
        let svc = rental_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.mark_overdue().await {
                    Ok(n) if n > 0 => log::info!("Rentals marked overdue: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to mark overdue rentals: {e:?}"),
                }
                tokio::time::sleep(overdue_interval).await;
            }
        });
    }

    // PENDING rentals the station never dispensed are cancelled and refunded
    {
        let svc = rental_service;
        let timeout = config.pending_rental_timeout_minutes;
        tokio::spawn(async move {
            loop {
                match svc.cancel_stale_pending(timeout).await {
                    Ok(n) if n > 0 => log::info!("Stale pending rentals cancelled: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to cancel stale pending rentals: {e:?}"),
                }
                tokio::time::sleep(overdue_interval).await;
            }
        });
    }

    {
        let svc = referral_service;
        let interval = Duration::from_secs(config.referral_expiry_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.expire_referrals().await {
                    Ok(n) if n > 0 => log::info!("Referrals expired: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire referrals: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
