//! Calculadora de comisiones
//!
//! Funciones puras: la comisión del mensajero se deriva del precio base y
//! del porcentaje de su contrato activo.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Contract, User};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{validate_non_negative, validate_percentage};

/// Redondeo monetario: 2 decimales, mitad hacia arriba
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Porcentaje de un monto, redondeado
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> Decimal {
    round_money(amount * percentage / Decimal::ONE_HUNDRED)
}

/// `commission = round(base_price × rate / 100, 2)`
pub fn compute_commission(base_price: Decimal, commission_percentage: Decimal) -> AppResult<Decimal> {
    validate_non_negative(base_price)
        .map_err(|_| validation_error("base_price", "must not be negative"))?;
    validate_percentage(commission_percentage)
        .map_err(|_| validation_error("commission_percentage", "must be between 0 and 100"))?;

    Ok(percentage_of(base_price, commission_percentage))
}

/// Exigir un contrato vigente en la fecha indicada
pub fn require_active_contract(
    courier_id: i64,
    contract: Option<Contract>,
    today: NaiveDate,
) -> AppResult<Contract> {
    match contract {
        Some(contract) if contract.courier_id == courier_id && contract.is_active_on(today) => {
            Ok(contract)
        }
        _ => Err(AppError::NoActiveContract { courier_id }),
    }
}

/// Un mensajero es elegible si existe, tiene rol de mensajero y está activo
pub fn ensure_courier_eligible(courier_id: i64, user: Option<User>) -> AppResult<User> {
    let user = user.ok_or_else(|| not_found_error("Courier", courier_id))?;

    if !user.is_courier() {
        return Err(AppError::CourierIneligible(format!(
            "user {} does not have the courier role",
            courier_id
        )));
    }
    if !user.active {
        return Err(AppError::CourierIneligible(format!(
            "courier {} is not active",
            courier_id
        )));
    }

    Ok(user)
}
