// Search, status filter and pagination over lists the backend already returned.

use crate::models::responses::{Booking, User};

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Confirmed,
    InTransit,
    Delivered,
    Cancelled,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 6] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Confirmed,
        StatusFilter::InTransit,
        StatusFilter::Delivered,
        StatusFilter::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Confirmed => "Confirmed",
            StatusFilter::InTransit => "In transit",
            StatusFilter::Delivered => "Delivered",
            StatusFilter::Cancelled => "Cancelled",
        }
    }

    /// Cycles through [`StatusFilter::ALL`].
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Backend statuses are matched after lowercasing and folding `-` and
    /// spaces into `_`. Both `confirmed` and `booking_confirmed` count as
    /// confirmed.
    pub fn matches(self, status: &str) -> bool {
        let status = normalize_status(status);
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == "pending",
            StatusFilter::Confirmed => status == "confirmed" || status == "booking_confirmed",
            StatusFilter::InTransit => status == "in_transit",
            StatusFilter::Delivered => status == "delivered",
            StatusFilter::Cancelled => status == "cancelled" || status == "canceled",
        }
    }
}

fn normalize_status(status: &str) -> String {
    status
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn booking_matches(booking: &Booking, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [
        booking.booking_number.as_str(),
        booking.customer.name.as_str(),
        booking.customer.email.as_str(),
        booking.origin.city.as_str(),
        booking.destination.city.as_str(),
    ]
    .iter()
    .any(|field| contains_folded(field, &needle))
}

pub fn filter_bookings<'a>(bookings: &'a [Booking], search: &str, status: StatusFilter) -> Vec<&'a Booking> {
    bookings
        .iter()
        .filter(|b| status.matches(&b.status) && booking_matches(b, search))
        .collect()
}

/// Bookings a shipment may be created from.
pub fn confirmed_bookings(bookings: &[Booking]) -> Vec<&Booking> {
    filter_bookings(bookings, "", StatusFilter::Confirmed)
}

pub fn filter_users<'a>(users: &'a [User], search: &str, role: Option<&str>) -> Vec<&'a User> {
    let needle = search.trim().to_lowercase();
    users
        .iter()
        .filter(|u| match role {
            Some(role) if !role.trim().is_empty() => u.role.eq_ignore_ascii_case(role.trim()),
            _ => true,
        })
        .filter(|u| {
            needle.is_empty()
                || [u.full_name.as_str(), u.email.as_str(), u.phone.as_str()]
                    .iter()
                    .any(|field| contains_folded(field, &needle))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    /// At least 1, so an empty list still has a page to show.
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// "Showing 11-20 of 42"
    pub fn summary(&self) -> String {
        if self.total == 0 {
            return "No results".to_string();
        }
        let first = (self.page - 1) * self.per_page + 1;
        let last = first + self.items.len() - 1;
        format!("Showing {}-{} of {}", first, last, self.total)
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::responses::{Address, Customer};

    fn booking(number: &str, status: &str, customer: &str, origin: &str) -> Booking {
        Booking {
            id: number.to_lowercase(),
            booking_number: number.to_string(),
            status: status.to_string(),
            customer: Customer {
                name: customer.to_string(),
                email: format!("{}@shipper.test", customer.to_lowercase()),
                ..Default::default()
            },
            origin: Address {
                city: origin.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sample() -> Vec<Booking> {
        vec![
            booking("BK-001", "pending", "Acme", "Lagos"),
            booking("BK-002", "confirmed", "Globex", "Accra"),
            booking("BK-003", "booking_confirmed", "Initech", "Lagos"),
            booking("BK-004", "In-Transit", "Acme", "Nairobi"),
        ]
    }

    #[test]
    fn both_confirmed_spellings_match() {
        let list = sample();
        let numbers: Vec<_> = confirmed_bookings(&list)
            .iter()
            .map(|b| b.booking_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["BK-002", "BK-003"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let list = sample();
        assert_eq!(filter_bookings(&list, "lagos", StatusFilter::All).len(), 2);
        assert_eq!(filter_bookings(&list, "ACME", StatusFilter::All).len(), 2);
        assert_eq!(filter_bookings(&list, "globex@", StatusFilter::All).len(), 1);
        assert_eq!(filter_bookings(&list, "acme", StatusFilter::InTransit).len(), 1);
        assert_eq!(filter_bookings(&list, "  ", StatusFilter::All).len(), 4);
    }

    #[test]
    fn users_filter_by_role_and_text() {
        let users = vec![
            User {
                id: "1".into(),
                full_name: "Ada Obi".into(),
                email: "ada@freight.test".into(),
                role: "admin".into(),
                ..Default::default()
            },
            User {
                id: "2".into(),
                full_name: "Kofi Mensah".into(),
                email: "kofi@freight.test".into(),
                role: "warehouse".into(),
                ..Default::default()
            },
        ];
        assert_eq!(filter_users(&users, "", Some("Warehouse")).len(), 1);
        assert_eq!(filter_users(&users, "ADA", None).len(), 1);
        assert_eq!(filter_users(&users, "freight.test", Some("")).len(), 2);
    }

    #[test]
    fn pages_are_one_based_and_clamped() {
        let items: Vec<u32> = (1..=23).collect();
        let first = paginate(&items, 0, 10);
        assert_eq!(first.page, 1);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert!(!first.has_previous());

        let last = paginate(&items, 99, 10);
        assert_eq!(last.page, 3);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(!last.has_next());
        assert_eq!(last.summary(), "Showing 21-23 of 23");
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let page = paginate::<u32>(&[], 4, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.summary(), "No results");
    }

    #[test]
    fn status_filter_cycles() {
        assert_eq!(StatusFilter::All.next(), StatusFilter::Pending);
        assert_eq!(StatusFilter::Cancelled.next(), StatusFilter::All);
    }
}
