#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub price: f64,
    pub sections: Vec<Section>,
}

impl Train {
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    pub fn serves(&self, origin: &str, destination: &str) -> bool {
        self.origin == origin && self.destination == destination
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub seats: Vec<Seat>,
}

impl Section {
    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == seat_id)
    }

    /// Counted from the seat flags, never cached.
    pub fn available_seats(&self) -> usize {
        self.seats.iter().filter(|seat| seat.available).count()
    }

    pub fn first_available(&self) -> Option<usize> {
        self.seats.iter().position(|seat| seat.available)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub id: String,
    pub section_id: String,
    pub section_name: String,
    pub seat_number: String,
    pub available: bool,
    /// Id of the occupying user.
    pub occupant: Option<String>,
}

impl Seat {
    pub(crate) fn claim(&mut self, user_id: &str) {
        self.available = false;
        self.occupant = Some(user_id.to_string());
    }

    pub(crate) fn release(&mut self) {
        self.available = true;
        self.occupant = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Receipt ids in purchase order.
    pub receipts: Vec<String>,
}

/// What a caller supplies to identify the buyer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub id: String,
    pub train_id: String,
    pub origin: String,
    pub destination: String,
    pub seat_id: String,
    pub seat_number: String,
    pub section_id: String,
    pub section_name: String,
    pub user_id: String,
    pub price: f64,
    pub status: BookingStatus,
}

impl Receipt {
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

/// Indices of a seat inside `Store::trains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatPos {
    pub train: usize,
    pub section: usize,
    pub seat: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptView {
    pub receipt_id: String,
    pub origin: String,
    pub destination: String,
    pub user: UserProfile,
    pub seat_number: String,
    pub section_name: String,
    pub price_paid: f64,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeatStatus {
    pub seat_id: String,
    pub seat_number: String,
    pub section_id: String,
    pub section_name: String,
    pub available: bool,
    pub occupant: Option<UserProfile>,
}
