//! Miscellaneous helper utilities: logging setup and bounded random draws.

use crate::errors::{AppError, Result};
use ethers::types::U256;
use ethers::utils::parse_units;
use rand::Rng;
use rand::distributions::uniform::SampleUniform;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt};

/// Fractional digits of every drawn trade amount.
pub const AMOUNT_DECIMALS: u32 = 6;
const MICROS_PER_UNIT: u128 = 1_000_000;

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    subscriber_fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Inclusive `[min, max]` range, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy + fmt::Display> Bounds<T> {
    pub fn new(min: T, max: T) -> Result<Self> {
        if min > max {
            return Err(AppError::Config(format!("lower bound {min} exceeds upper bound {max}")));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }
}

impl<T: PartialOrd + Copy + fmt::Display + SampleUniform> Bounds<T> {
    /// Uniform draw, both ends included.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        rng.gen_range(self.min..=self.max)
    }
}

impl<T: fmt::Display> fmt::Display for Bounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Trade amount bounds in token units, held as integer millionths so draws
/// are exact and never leave the range after rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBounds(Bounds<u128>);

impl AmountBounds {
    pub fn parse(min: &str, max: &str) -> Result<Self> {
        Ok(Self(Bounds::new(to_micros(min)?, to_micros(max)?)?))
    }

    /// Decimal string with exactly six fractional digits.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        format_micros(self.0.draw(rng))
    }
}

impl fmt::Display for AmountBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]",
            format_micros(self.0.min()),
            format_micros(self.0.max())
        )
    }
}

fn to_micros(raw: &str) -> Result<u128> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err(AppError::Config(format!("amount {raw} must not be negative")));
    }
    let fraction_digits = raw.split_once('.').map_or(0, |(_, frac)| frac.len());
    if fraction_digits > AMOUNT_DECIMALS as usize {
        return Err(AppError::Config(format!(
            "amount {raw} has more than {AMOUNT_DECIMALS} fractional digits"
        )));
    }
    let micros: U256 = parse_units(raw, AMOUNT_DECIMALS)?.into();
    u128::try_from(micros).map_err(|_| AppError::Config(format!("amount {raw} is too large")))
}

fn format_micros(micros: u128) -> String {
    format!("{}.{:06}", micros / MICROS_PER_UNIT, micros % MICROS_PER_UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn bounds_reject_inverted_range() {
        assert!(Bounds::new(5u64, 4).is_err());
        assert!(Bounds::new(5u64, 5).is_ok());
    }

    #[test]
    fn integer_draws_stay_inside_and_reach_both_ends() {
        let mut rng = StdRng::seed_from_u64(7);
        let bounds = Bounds::new(10u64, 12).unwrap();
        let draws: Vec<u64> = (0..500).map(|_| bounds.draw(&mut rng)).collect();
        assert!(draws.iter().all(|d| (10..=12).contains(d)));
        assert!(draws.contains(&10));
        assert!(draws.contains(&12));
    }

    #[test]
    fn degenerate_range_always_returns_the_bound() {
        let mut rng = StdRng::seed_from_u64(1);
        let amounts = AmountBounds::parse("1", "1").unwrap();
        for _ in 0..50 {
            assert_eq!(amounts.draw(&mut rng), "1.000000");
        }
        let secs = Bounds::new(5u64, 5).unwrap();
        assert_eq!(secs.draw(&mut rng), 5);
    }

    #[test]
    fn amount_draws_have_six_decimals_and_respect_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let amounts = AmountBounds::parse("0.5", "2.25").unwrap();
        for _ in 0..1000 {
            let drawn = amounts.draw(&mut rng);
            let (_, frac) = drawn.split_once('.').unwrap();
            assert_eq!(frac.len(), 6);
            let value: f64 = drawn.parse().unwrap();
            assert!((0.5..=2.25).contains(&value), "{drawn}");
        }
    }

    #[test]
    fn amount_draws_reach_both_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let amounts = AmountBounds::parse("0.000001", "0.000002").unwrap();
        let draws: Vec<String> = (0..200).map(|_| amounts.draw(&mut rng)).collect();
        assert!(draws.iter().any(|d| d == "0.000001"));
        assert!(draws.iter().any(|d| d == "0.000002"));
    }

    #[test]
    fn amount_parsing_rejects_bad_input() {
        assert!(AmountBounds::parse("-1", "2").is_err());
        assert!(AmountBounds::parse("0.1234567", "2").is_err());
        assert!(AmountBounds::parse("3", "2").is_err());
        assert!(AmountBounds::parse("abc", "2").is_err());
    }

    #[test]
    fn display_formats_range() {
        let amounts = AmountBounds::parse("1", "2.5").unwrap();
        assert_eq!(amounts.to_string(), "[1.000000, 2.500000]");
    }
}
