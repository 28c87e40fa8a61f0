// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};

use serde::ser::Serializer;
use serde::Serialize;

const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// A mapping number. Integers stay integers until an operation leaves the
/// integral domain or overflows `i64`.
#[derive(Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn normalize_float(value: f64) -> Number {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= F64_SAFE_INTEGER {
            return Number::Int(value as i64);
        }
        Number::Float(value)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(f) => *f,
        }
    }

    /// Integral value, if the number has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(*v),
            Number::Float(f)
                if f.is_finite() && f.fract() == 0.0 && f.abs() <= F64_SAFE_INTEGER =>
            {
                Some(*f as i64)
            }
            Number::Float(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

    pub fn is_integer(&self) -> bool {
        self.as_i64().is_some()
    }

    fn is_zero(&self) -> bool {
        match self {
            Number::Int(v) => *v == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn add(&self, rhs: &Self) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(*b) {
                Some(sum) => Number::Int(sum),
                None => Number::Float(*a as f64 + *b as f64),
            },
            _ => Number::Float(self.as_f64() + rhs.as_f64()),
        }
    }

    pub fn sub(&self, rhs: &Self) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_sub(*b) {
                Some(diff) => Number::Int(diff),
                None => Number::Float(*a as f64 - *b as f64),
            },
            _ => Number::Float(self.as_f64() - rhs.as_f64()),
        }
    }

    pub fn mul(&self, rhs: &Self) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_mul(*b) {
                Some(product) => Number::Int(product),
                None => Number::Float(*a as f64 * *b as f64),
            },
            _ => Number::Float(self.as_f64() * rhs.as_f64()),
        }
    }

    /// Exact integer division stays integral. `None` on a zero divisor.
    pub fn divide(&self, rhs: &Self) -> Option<Number> {
        if rhs.is_zero() {
            return None;
        }
        Some(match (self, rhs) {
            (Number::Int(a), Number::Int(b)) if a.checked_rem(*b) == Some(0) => {
                match a.checked_div(*b) {
                    Some(q) => Number::Int(q),
                    None => Number::Float(*a as f64 / *b as f64),
                }
            }
            _ => Number::Float(self.as_f64() / rhs.as_f64()),
        })
    }

    /// Remainder with the sign of the dividend. `None` on a zero divisor.
    pub fn modulo(&self, rhs: &Self) -> Option<Number> {
        if rhs.is_zero() {
            return None;
        }
        Some(match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_rem(*b) {
                Some(r) => Number::Int(r),
                None => Number::Int(0),
            },
            _ => Number::Float(self.as_f64() % rhs.as_f64()),
        })
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Int(v) => match v.checked_neg() {
                Some(n) => Number::Int(n),
                None => Number::Float(-(*v as f64)),
            },
            Number::Float(f) => Number::Float(-f),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Int(v) => match v.checked_abs() {
                Some(abs) => Number::Int(abs),
                None => Number::Float((*v as f64).abs()),
            },
            Number::Float(f) => Number::Float(f.abs()),
        }
    }

    pub fn floor(&self) -> Number {
        match self {
            Number::Float(f) => Number::normalize_float(f.floor()),
            _ => *self,
        }
    }

    pub fn ceil(&self) -> Number {
        match self {
            Number::Float(f) => Number::normalize_float(f.ceil()),
            _ => *self,
        }
    }

    pub fn round(&self) -> Number {
        match self {
            Number::Float(f) => Number::normalize_float(f.round()),
            _ => *self,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::Int(v) => serializer.serialize_i64(*v),
            Number::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value as i64)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Number::Int(v),
            Err(_) => Number::Float(value as f64),
        }
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::from(value as u64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_arithmetic_stays_integral() {
        assert!(matches!(Number::Int(4).add(&Number::Int(5)), Number::Int(9)));
        assert!(matches!(Number::Int(6).divide(&Number::Int(3)), Some(Number::Int(2))));
        assert!(matches!(Number::Int(7).modulo(&Number::Int(3)), Some(Number::Int(1))));
    }

    #[test]
    fn inexact_division_becomes_float() {
        match Number::Int(5).divide(&Number::Int(2)) {
            Some(Number::Float(f)) => assert_eq!(f, 2.5),
            n => panic!("unexpected {n:?}"),
        }
    }

    #[test]
    fn division_by_zero() {
        assert!(Number::Int(1).divide(&Number::Int(0)).is_none());
        assert!(Number::Float(1.0).modulo(&Number::Float(0.0)).is_none());
    }

    #[test]
    fn overflow_falls_back_to_float() {
        assert!(matches!(Number::Int(i64::MAX).add(&Number::Int(1)), Number::Float(_)));
        assert!(matches!(Number::Int(i64::MIN).neg(), Number::Float(_)));
    }

    #[test]
    fn cross_kind_equality() {
        assert_eq!(Number::Int(1), Number::Float(1.0));
        assert_ne!(Number::Int(1), Number::Float(1.5));
        assert_eq!(Number::Int(2).compare(&Number::Float(1.5)), Ordering::Greater);
    }

    #[test]
    fn rounding_produces_integers() {
        assert!(matches!(Number::Float(2.5).floor(), Number::Int(2)));
        assert!(matches!(Number::Float(2.1).ceil(), Number::Int(3)));
        assert!(matches!(Number::Float(-2.5).round(), Number::Int(-3)));
    }
}
