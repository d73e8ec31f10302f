//! Calculadora de penalizaciones por cancelación
//!
//! Función pura. El conteo de cancelaciones del periodo lo aporta el
//! servicio de cancelación (consulta sobre el almacén de cancelaciones),
//! de modo que aquí no hay estado compartido.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{CancellationInitiator, LoyaltyLevel};
use crate::services::commission::percentage_of;

/// Resultado monetario de una cancelación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PenaltyOutcome {
    /// Monto cobrado al negocio
    pub penalty_amount: Decimal,
    /// Monto que se sigue pagando al mensajero
    pub courier_payment: Decimal,
    /// La cancelación consumió una de las gratuitas del periodo
    pub free_cancellation_used: bool,
}

pub fn compute_penalty(
    commission: Decimal,
    initiator: CancellationInitiator,
    loyalty_level: Option<&LoyaltyLevel>,
    cancellations_this_period: i64,
) -> PenaltyOutcome {
    match initiator {
        CancellationInitiator::Cliente => PenaltyOutcome {
            penalty_amount: Decimal::ZERO,
            courier_payment: commission,
            free_cancellation_used: false,
        },
        CancellationInitiator::Negocio => {
            let (allowance, penalty_percentage) = loyalty_level
                .map(|level| {
                    (
                        i64::from(level.free_cancellations_per_month.max(0)),
                        level.penalty_percentage,
                    )
                })
                .unwrap_or((0, Decimal::ZERO));

            if cancellations_this_period >= allowance {
                let penalty = percentage_of(commission, penalty_percentage);
                PenaltyOutcome {
                    penalty_amount: penalty,
                    courier_payment: penalty,
                    free_cancellation_used: false,
                }
            } else {
                PenaltyOutcome {
                    penalty_amount: Decimal::ZERO,
                    courier_payment: Decimal::ZERO,
                    free_cancellation_used: true,
                }
            }
        }
    }
}

/// Límites `[inicio, fin)` del mes calendario que contiene `now`
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_of = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|midnight| Utc.from_utc_datetime(&midnight))
    };
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    let start = start_of(now.year(), now.month()).unwrap_or(now);
    let end = start_of(next_year, next_month).unwrap_or(now);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(free: i32, penalty: Decimal) -> LoyaltyLevel {
        LoyaltyLevel {
            id: 1,
            name: "Bronce".to_string(),
            discount_percentage: Decimal::ZERO,
            penalty_percentage: penalty,
            free_cancellations_per_month: free,
        }
    }

    #[test]
    fn test_business_cancellation_with_exhausted_allowance() {
        let outcome = compute_penalty(
            Decimal::new(3000, 2),
            CancellationInitiator::Negocio,
            Some(&level(2, Decimal::new(15, 0))),
            2,
        );

        assert_eq!(outcome.penalty_amount, Decimal::new(450, 2));
        assert_eq!(outcome.courier_payment, Decimal::new(450, 2));
        assert!(!outcome.free_cancellation_used);
    }

    #[test]
    fn test_business_cancellation_within_allowance() {
        let outcome = compute_penalty(
            Decimal::new(3000, 2),
            CancellationInitiator::Negocio,
            Some(&level(3, Decimal::new(15, 0))),
            1,
        );

        assert_eq!(outcome.penalty_amount, Decimal::ZERO);
        assert_eq!(outcome.courier_payment, Decimal::ZERO);
        assert!(outcome.free_cancellation_used);
    }

    #[test]
    fn test_customer_cancellation_pays_full_commission() {
        let outcome = compute_penalty(
            Decimal::new(3000, 2),
            CancellationInitiator::Cliente,
            Some(&level(0, Decimal::new(50, 0))),
            10,
        );

        assert_eq!(outcome.penalty_amount, Decimal::ZERO);
        assert_eq!(outcome.courier_payment, Decimal::new(3000, 2));
    }

    #[test]
    fn test_business_without_loyalty_level_pays_nothing() {
        let outcome =
            compute_penalty(Decimal::new(3000, 2), CancellationInitiator::Negocio, None, 0);
        assert_eq!(outcome.penalty_amount, Decimal::ZERO);
        assert!(!outcome.free_cancellation_used);
    }

    #[test]
    fn test_month_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 12, 15, 10, 30, 0).unwrap();
        let (start, end) = month_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }
}
