pub mod order;
pub mod product;

/// Money fields are emitted at a fixed two-decimal scale. `Decimal` keeps
/// whatever scale the database hands back (SQLite drops trailing zeros, so
/// `10.00` comes back as `10`), which would leak backend differences into
/// the wire format.
pub mod money {
    use rust_decimal::Decimal;
    use serde::{Serialize, Serializer};

    /// Rounds to 2 dp and pins the scale so `10` serializes as `"10.00"`.
    pub fn two_dp(value: Decimal) -> Decimal {
        let mut normalized = value.round_dp(2);
        normalized.rescale(2);
        normalized
    }

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&two_dp(*value), serializer)
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(two_dp).serialize(serializer)
    }

}
