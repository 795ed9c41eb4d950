use std::collections::HashMap;

use rail_common::config::{ServerConfig, TrainSeed, UserSeed};
use rail_common::ids::new_seat_id;

use crate::discount::DiscountBook;
use crate::error::{BookingError, Result};
use crate::model::{Receipt, Seat, SeatPos, Section, Train, User, UserProfile};

const DEFAULT_SECTION_COUNT: usize = 2;
const DEFAULT_SEAT_COUNT: usize = 20;
const DEFAULT_PRICE: f64 = 20.0;

/// Root aggregate for everything the booking operations touch.
///
/// Trains keep their shape for the lifetime of the store, so a [`SeatPos`] obtained from
/// [`Store::locate_seat`] stays valid across later mutations.
#[derive(Debug, Default)]
pub struct Store {
    pub trains: Vec<Train>,
    pub users: Vec<User>,
    pub receipts: HashMap<String, Receipt>,
    pub discounts: DiscountBook,
}

impl Store {
    pub fn new(trains: Vec<Train>, users: Vec<User>, discounts: DiscountBook) -> Self {
        Self {
            trains,
            users,
            receipts: HashMap::new(),
            discounts,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let trains = config
            .trains
            .iter()
            .map(train_from_seed)
            .collect::<Result<Vec<_>>>()?;
        let users = config.users.iter().map(user_from_seed).collect();
        Ok(Self::new(
            trains,
            users,
            DiscountBook::from_config(&config.discount)?,
        ))
    }

    pub fn train(&self, train_id: &str) -> Option<&Train> {
        self.trains.iter().find(|train| train.id == train_id)
    }

    /// Train used when a request does not name one.
    pub fn default_train(&self) -> Option<&Train> {
        self.trains.first()
    }

    pub fn train_for_route(&self, origin: &str, destination: &str) -> Option<&Train> {
        self.trains
            .iter()
            .find(|train| train.serves(origin, destination))
    }

    pub fn section(&self, train_id: &str, section_id: &str) -> Option<&Section> {
        self.train(train_id)?.section(section_id)
    }

    pub fn seat(&self, train_id: &str, section_id: &str, seat_id: &str) -> Option<&Seat> {
        self.section(train_id, section_id)?.seat(seat_id)
    }

    pub fn locate_seat(&self, train_id: &str, section_id: &str, seat_id: &str) -> Option<SeatPos> {
        let train = self.trains.iter().position(|train| train.id == train_id)?;
        let section = self.trains[train]
            .sections
            .iter()
            .position(|section| section.id == section_id)?;
        let seat = self.trains[train].sections[section]
            .seats
            .iter()
            .position(|seat| seat.id == seat_id)?;
        Some(SeatPos {
            train,
            section,
            seat,
        })
    }

    pub fn seat_at(&self, pos: SeatPos) -> Option<&Seat> {
        self.trains
            .get(pos.train)?
            .sections
            .get(pos.section)?
            .seats
            .get(pos.seat)
    }

    pub fn seat_at_mut(&mut self, pos: SeatPos) -> Option<&mut Seat> {
        self.trains
            .get_mut(pos.train)?
            .sections
            .get_mut(pos.section)?
            .seats
            .get_mut(pos.seat)
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == user_id)
    }

    /// Adds `profile` as a new user unless its id is already known. Returns whether a
    /// user was created; an existing user keeps its stored fields.
    pub fn register_user(&mut self, profile: &UserProfile) -> bool {
        if self.user(&profile.id).is_some() {
            return false;
        }
        self.users.push(User {
            id: profile.id.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            receipts: Vec::new(),
        });
        true
    }

    pub fn receipt(&self, receipt_id: &str) -> Result<&Receipt> {
        self.receipts
            .get(receipt_id)
            .ok_or_else(|| BookingError::ReceiptNotFound(receipt_id.to_string()))
    }

    pub fn receipt_mut(&mut self, receipt_id: &str) -> Result<&mut Receipt> {
        self.receipts
            .get_mut(receipt_id)
            .ok_or_else(|| BookingError::ReceiptNotFound(receipt_id.to_string()))
    }

    /// Cross-checks seats, receipts and users against each other.
    ///
    /// Every confirmed receipt must point at exactly one taken seat occupied by its user,
    /// every taken seat must be backed by one confirmed receipt, and every receipt must
    /// appear in exactly its owner's list.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for receipt in self.receipts.values() {
            if receipt.is_cancelled() {
                continue;
            }
            let seat = self
                .seat(&receipt.train_id, &receipt.section_id, &receipt.seat_id)
                .ok_or_else(|| format!("receipt {} points at a missing seat", receipt.id))?;
            if seat.available {
                return Err(format!("receipt {} holds a free seat", receipt.id));
            }
            if seat.occupant.as_deref() != Some(receipt.user_id.as_str()) {
                return Err(format!("receipt {} seat occupied by someone else", receipt.id));
            }
            if claimed.insert(seat.id.as_str(), receipt.id.as_str()).is_some() {
                return Err(format!("seat {} claimed by two receipts", seat.id));
            }
        }

        for train in &self.trains {
            for section in &train.sections {
                for seat in &section.seats {
                    if seat.available != seat.occupant.is_none() {
                        return Err(format!("seat {} flag disagrees with occupant", seat.id));
                    }
                    if !seat.available && !claimed.contains_key(seat.id.as_str()) {
                        return Err(format!("seat {} taken without a receipt", seat.id));
                    }
                }
            }
        }

        let mut listed = 0;
        for user in &self.users {
            for receipt_id in &user.receipts {
                let receipt = self
                    .receipts
                    .get(receipt_id)
                    .ok_or_else(|| format!("user {} lists unknown receipt {receipt_id}", user.id))?;
                if receipt.user_id != user.id {
                    return Err(format!("receipt {receipt_id} listed under {}", user.id));
                }
                listed += 1;
            }
        }
        if listed != self.receipts.len() {
            return Err(format!(
                "{} receipts stored but {listed} listed under users",
                self.receipts.len()
            ));
        }
        Ok(())
    }
}

/// Builds a train with `section_count` sections of `seat_count` seats each.
///
/// Zero counts and a zero price fall back to two sections, twenty seats and a fare of 20.
pub fn generate_train(
    id: &str,
    origin: &str,
    destination: &str,
    section_count: usize,
    seat_count: usize,
    price: f64,
) -> Result<Train> {
    if origin.trim().is_empty() || destination.trim().is_empty() {
        return Err(BookingError::InvalidRequest(
            "origin and destination are required to create a train".to_string(),
        ));
    }
    let section_count = if section_count == 0 {
        DEFAULT_SECTION_COUNT
    } else {
        section_count
    };
    let seat_count = if seat_count == 0 {
        DEFAULT_SEAT_COUNT
    } else {
        seat_count
    };
    let price = if price <= 0.0 { DEFAULT_PRICE } else { price };

    let sections = (1..=section_count)
        .map(|n| {
            let section_id = format!("S{n}");
            Section {
                seats: generate_seats(&section_id, &section_id, seat_count),
                name: section_id.clone(),
                id: section_id,
            }
        })
        .collect();

    Ok(Train {
        id: id.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        price,
        sections,
    })
}

fn generate_seats(section_id: &str, section_name: &str, seat_count: usize) -> Vec<Seat> {
    (1..=seat_count)
        .map(|n| Seat {
            id: new_seat_id(),
            section_id: section_id.to_string(),
            section_name: section_name.to_string(),
            seat_number: format!("Seat{n}"),
            available: true,
            occupant: None,
        })
        .collect()
}

fn train_from_seed(seed: &TrainSeed) -> Result<Train> {
    generate_train(
        &seed.id,
        &seed.origin,
        &seed.destination,
        seed.sections,
        seed.seats_per_section,
        seed.price,
    )
}

fn user_from_seed(seed: &UserSeed) -> User {
    User {
        id: seed.id.clone(),
        first_name: seed.first_name.clone(),
        last_name: seed.last_name.clone(),
        email: seed.email.clone(),
        receipts: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_common::config::DiscountConfig;

    #[test]
    fn generated_train_layout() {
        let train = generate_train("T1", "London", "France", 2, 3, 20.0).unwrap();
        assert_eq!(train.sections.len(), 2);
        assert_eq!(train.sections[1].id, "S2");
        assert_eq!(train.sections[1].name, "S2");
        let numbers: Vec<_> = train.sections[0]
            .seats
            .iter()
            .map(|seat| seat.seat_number.as_str())
            .collect();
        assert_eq!(numbers, ["Seat1", "Seat2", "Seat3"]);
        assert!(train.sections[0].seats.iter().all(|seat| seat.available));
        assert_eq!(train.sections[0].seats[2].section_id, "S1");
        assert_eq!(train.sections[0].available_seats(), 3);
    }

    #[test]
    fn generated_train_defaults() {
        let train = generate_train("T1", "London", "France", 0, 0, 0.0).unwrap();
        assert_eq!(train.sections.len(), 2);
        assert_eq!(train.sections[0].seats.len(), 20);
        assert_eq!(train.price, 20.0);
    }

    #[test]
    fn generated_train_requires_route() {
        assert!(matches!(
            generate_train("T1", "", "France", 1, 1, 1.0),
            Err(BookingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn seat_ids_are_unique_across_trains() {
        let a = generate_train("T1", "London", "France", 2, 5, 1.0).unwrap();
        let b = generate_train("T2", "London", "France", 2, 5, 1.0).unwrap();
        let mut ids: Vec<_> = a
            .sections
            .iter()
            .chain(b.sections.iter())
            .flat_map(|section| section.seats.iter().map(|seat| seat.id.clone()))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn store_from_config_seeds_trains_and_users() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            discount: DiscountConfig::default(),
            trains: vec![TrainSeed {
                id: "T1".to_string(),
                origin: "London".to_string(),
                destination: "France".to_string(),
                price: 20.0,
                sections: 2,
                seats_per_section: 20,
            }],
            users: vec![UserSeed {
                id: "1".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                email: "alice@example.com".to_string(),
            }],
        };
        let store = Store::from_config(&config).unwrap();
        assert_eq!(store.default_train().map(|t| t.id.as_str()), Some("T1"));
        assert!(store.train_for_route("London", "France").is_some());
        assert!(store.train_for_route("France", "London").is_none());
        assert_eq!(store.section("T1", "S2").map(|s| s.seats.len()), Some(20));
        assert!(store.user("1").is_some());
        assert!(store.user("2").is_none());
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn lookups_miss_cleanly() {
        let train = generate_train("T1", "London", "France", 1, 2, 5.0).unwrap();
        let seat_id = train.sections[0].seats[1].id.clone();
        let store = Store::new(vec![train], Vec::new(), DiscountBook::default());

        assert!(store.train("T9").is_none());
        assert!(store.section("T1", "S9").is_none());
        assert!(store.seat("T1", "S1", "nope").is_none());
        assert!(store.seat("T1", "S2", &seat_id).is_none());
        assert_eq!(
            store.locate_seat("T1", "S1", &seat_id),
            Some(SeatPos {
                train: 0,
                section: 0,
                seat: 1
            })
        );
        assert_eq!(
            store.receipt("r-1"),
            Err(BookingError::ReceiptNotFound("r-1".to_string()))
        );
    }

    #[test]
    fn register_user_keeps_existing_profile() {
        let mut store = Store::default();
        let profile = UserProfile {
            id: "7".to_string(),
            first_name: "Carol".to_string(),
            last_name: "Jones".to_string(),
            email: "carol@example.com".to_string(),
        };
        assert!(store.register_user(&profile));
        let renamed = UserProfile {
            first_name: "Someone".to_string(),
            ..profile
        };
        assert!(!store.register_user(&renamed));
        assert_eq!(store.users.len(), 1);
        assert_eq!(store.user("7").map(|u| u.first_name.as_str()), Some("Carol"));
    }

    #[test]
    fn consistency_check_catches_orphan_seat() {
        let train = generate_train("T1", "London", "France", 1, 2, 5.0).unwrap();
        let mut store = Store::new(vec![train], Vec::new(), DiscountBook::default());
        let pos = SeatPos {
            train: 0,
            section: 0,
            seat: 0,
        };
        if let Some(seat) = store.seat_at_mut(pos) {
            seat.claim("1");
        }
        assert!(store.check_consistency().is_err());
    }
}
