//! Weekdays and the fixed seven-slot [`WeekMap`].
//!
//! A week is always exactly seven slots, Monday first. There is no way to
//! build a `WeekMap` with a missing day, so "every day is present" holds by
//! construction rather than by convention.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// One of the seven canonical weekday names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in calendar-grid order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based slot index, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.name() == s)
            .ok_or_else(|| ValidationError::UnknownDay(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// WeekMap
// ---------------------------------------------------------------------------

/// Exactly one `T` per weekday.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekMap<T> {
    slots: [T; 7],
}

impl<T> WeekMap<T> {
    /// Build a map by calling `f` once per weekday, Monday first.
    pub fn from_fn(mut f: impl FnMut(Weekday) -> T) -> Self {
        Self {
            slots: std::array::from_fn(|i| f(Weekday::ALL[i])),
        }
    }

    pub fn get(&self, day: Weekday) -> &T {
        &self.slots[day.index()]
    }

    pub fn get_mut(&mut self, day: Weekday) -> &mut T {
        &mut self.slots[day.index()]
    }

    /// Iterate `(day, value)` pairs Monday first.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &T)> {
        Weekday::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Weekday, &mut T)> {
        Weekday::ALL.into_iter().zip(self.slots.iter_mut())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Weekday, &T) -> U) -> WeekMap<U> {
        WeekMap::from_fn(|day| f(day, self.get(day)))
    }
}

impl<T> Index<Weekday> for WeekMap<T> {
    type Output = T;

    fn index(&self, day: Weekday) -> &T {
        self.get(day)
    }
}

impl<T> IndexMut<Weekday> for WeekMap<T> {
    fn index_mut(&mut self, day: Weekday) -> &mut T {
        self.get_mut(day)
    }
}

impl<T: Serialize> Serialize for WeekMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for (day, value) in self.iter() {
            map.serialize_entry(day.name(), value)?;
        }
        map.end()
    }
}

impl<'de, T> Deserialize<'de> for WeekMap<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeekMapVisitor<T>(std::marker::PhantomData<T>);

        impl<'de, T> Visitor<'de> for WeekMapVisitor<T>
        where
            T: Deserialize<'de> + Default,
        {
            type Value = WeekMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by weekday name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                // Older documents omit empty days; absent keys become T::default().
                let mut week = WeekMap::<T>::default();
                let mut seen = [false; 7];
                while let Some((day, value)) = access.next_entry::<Weekday, T>()? {
                    if std::mem::replace(&mut seen[day.index()], true) {
                        return Err(A::Error::duplicate_field(day.name()));
                    }
                    week[day] = value;
                }
                Ok(week)
            }
        }

        deserializer.deserialize_map(WeekMapVisitor(std::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_names() {
        for day in Weekday::ALL {
            assert_eq!(day.name().parse::<Weekday>().unwrap(), day);
            assert_eq!(day.to_string(), day.name());
        }
        assert!("monday".parse::<Weekday>().is_err());
        assert!("Funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn chrono_conversion_round_trips() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from(day.to_chrono()), day);
        }
    }

    #[test]
    fn serializes_all_seven_keys() {
        let week: WeekMap<Vec<u32>> = WeekMap::default();
        let json = serde_json::to_value(&week).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 7);
        for day in Weekday::ALL {
            assert!(obj.contains_key(day.name()));
        }
    }

    #[test]
    fn missing_days_are_filled_on_deserialize() {
        let week: WeekMap<Vec<u32>> = serde_json::from_str(r#"{"Wednesday":[3]}"#).unwrap();
        assert_eq!(week[Weekday::Wednesday], vec![3]);
        assert!(week[Weekday::Monday].is_empty());
        assert!(week[Weekday::Sunday].is_empty());

        let empty: WeekMap<Vec<u32>> = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, WeekMap::default());
    }

    #[test]
    fn unknown_day_key_is_rejected() {
        let res: Result<WeekMap<Vec<u32>>, _> = serde_json::from_str(r#"{"Caturday":[]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn repeated_day_key_is_rejected() {
        let res: Result<WeekMap<Vec<u32>>, _> =
            serde_json::from_str(r#"{"Monday":[1],"Monday":[2]}"#);
        let err = res.unwrap_err().to_string();
        assert!(err.contains("duplicate field `Monday`"), "{err}");
    }
}
