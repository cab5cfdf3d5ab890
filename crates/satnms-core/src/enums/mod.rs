//! Enumerated field vocabularies.
//!
//! Every family is a plain Rust enum generated by [`enum_family!`] from one
//! ordered list of `(code, label)` pairs. The numeric view (`CODES`) and the
//! label view (`LABELS`) are emitted from that same list, so they always have
//! equal length and identical ordering. Deprecated members stay addressable
//! by code and label but are left out of [`EnumFamily::active`].
//!
//! [`EnumRegistry`] offers the same tables by family name for callers that
//! only know the family at runtime (the CLI, payload normalization).

use std::fmt;

use serde_json::Value;

use crate::error::CoreError;

/// Generate an enum family and its [`EnumFamily`] impl.
///
/// ```ignore
/// enum_family! {
///     pub enum RollOff("roll_off") {
///         R35 = 0 => "35%",
///         R20 = 1 => "20%",
///     }
///     deprecated: [R35]
/// }
/// ```
macro_rules! enum_family {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($family:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
        $( deprecated: [ $($dep:ident),* $(,)? ] )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::strum::EnumIter, ::strum::EnumCount)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::enums::EnumFamily for $name {
            const FAMILY: &'static str = $family;
            const CODES: &'static [i64] = &[$($code),+];
            const LABELS: &'static [&'static str] = &[$($label),+];
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const DEPRECATED: &'static [Self] = &[$($(Self::$dep),*)?];

            fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::enums::EnumFamily::label(*self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::enums::EnumFamily>::parse(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::enums::EnumFamily::label(*self))
            }
        }
    };
}

mod families;
mod registry;

pub use families::{
    AccessLevel, ControllerMode, DeviceModel, DeviceState, Modulation, ObjectState, RollOff,
    RouteType, ShaperMode, StationMode,
};
pub use registry::{Direction, EnumRegistry, FamilyEntry, FamilyTable};

/// A closed vocabulary with parallel numeric and label views.
pub trait EnumFamily: Copy + Eq + fmt::Debug + 'static {
    /// Registry name of the family, e.g. `object_state`.
    const FAMILY: &'static str;
    /// Wire codes, in declaration order.
    const CODES: &'static [i64];
    /// Labels, position-aligned with `CODES`.
    const LABELS: &'static [&'static str];
    /// Every member, position-aligned with `CODES`.
    const ALL: &'static [Self];
    const DEPRECATED: &'static [Self];

    fn code(self) -> i64;
    fn label(self) -> &'static str;

    fn is_deprecated(self) -> bool {
        Self::DEPRECATED.contains(&self)
    }

    fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.code() == code)
    }

    /// Exact match first, then ASCII case-insensitive.
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.label() == label)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(label))
            })
    }

    /// Accept either a label or a decimal code.
    fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_label(raw)
            .or_else(|| raw.trim().parse::<i64>().ok().and_then(Self::from_code))
            .ok_or_else(|| CoreError::UnknownEnumValue {
                family: Self::FAMILY.to_owned(),
                value: raw.to_owned(),
            })
    }

    /// Decode a parameter value as the NMS returned it (number or string).
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_code),
            Value::String(s) => Self::parse(s).ok(),
            _ => None,
        }
    }

    /// Members that are not deprecated, in declaration order.
    fn active() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(|v| !v.is_deprecated())
    }

    /// The numeric view rendered as strings (`"0"`, `"1"`, ...).
    ///
    /// Iterating codes never yields labels; use `LABELS` or [`label`](Self::label)
    /// for those.
    fn code_strings() -> Vec<String> {
        Self::CODES.iter().map(ToString::to_string).collect()
    }
}

/// A field value in either encoding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Code(i64),
    Label(String),
}

impl EnumValue {
    /// Decimal input becomes a code, anything else a label.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map_or_else(|_| Self::Label(raw.trim().to_owned()), Self::Code)
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Code),
            Value::String(s) => Some(Self::Label(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Code(c) => Value::from(*c),
            Self::Label(l) => Value::String(l.clone()),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(c) => write!(f, "{c}"),
            Self::Label(l) => f.write_str(l),
        }
    }
}

impl<T: EnumFamily> From<T> for EnumValue {
    fn from(v: T) -> Self {
        Self::Label(v.label().to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    fn check_family<T: EnumFamily + IntoEnumIterator + EnumCount>() {
        assert_eq!(T::CODES.len(), T::LABELS.len(), "{}", T::FAMILY);
        assert_eq!(T::ALL.len(), T::COUNT, "{}", T::FAMILY);

        for (pos, member) in T::iter().enumerate() {
            assert_eq!(T::ALL[pos], member);
            assert_eq!(T::CODES[pos], member.code());
            assert_eq!(T::LABELS[pos], member.label());

            let code = T::from_label(member.label()).unwrap().code();
            assert_eq!(T::from_code(code).unwrap().label(), member.label());
        }
    }

    #[test]
    fn every_family_has_aligned_views_and_round_trips() {
        check_family::<ObjectState>();
        check_family::<DeviceState>();
        check_family::<ControllerMode>();
        check_family::<StationMode>();
        check_family::<DeviceModel>();
        check_family::<Modulation>();
        check_family::<RollOff>();
        check_family::<ShaperMode>();
        check_family::<RouteType>();
        check_family::<AccessLevel>();
    }

    #[test]
    fn deprecated_members_are_addressable_but_inactive() {
        let hub = ControllerMode::from_label("hub").unwrap();
        assert!(hub.is_deprecated());
        assert_eq!(ControllerMode::from_code(hub.code()), Some(hub));
        assert!(ControllerMode::active().all(|m| m != hub));
        assert_eq!(ControllerMode::active().count(), ControllerMode::ALL.len() - 1);
    }

    #[test]
    fn code_strings_are_stringified_numbers() {
        assert_eq!(ObjectState::code_strings(), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn parse_accepts_label_code_and_case() {
        assert_eq!("Up".parse::<ObjectState>().unwrap(), ObjectState::Up);
        assert_eq!("up".parse::<ObjectState>().unwrap(), ObjectState::Up);
        assert_eq!("2".parse::<ObjectState>().unwrap(), ObjectState::Fault);
        assert!(matches!(
            "sideways".parse::<ObjectState>(),
            Err(CoreError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn from_json_accepts_both_encodings() {
        assert_eq!(ObjectState::from_json(&Value::from(0)), Some(ObjectState::Up));
        assert_eq!(
            ObjectState::from_json(&Value::from("Unreachable")),
            Some(ObjectState::Unreachable)
        );
        assert_eq!(ObjectState::from_json(&Value::Null), None);
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_value(ControllerMode::MfHub).unwrap();
        assert_eq!(json, Value::from("MF_hub"));
    }
}
