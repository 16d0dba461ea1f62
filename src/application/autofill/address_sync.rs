//! Head-office address propagation

use crate::domain::onboarding::{Address, BusinessLocation, CompanyInfo, ContactInfo};

/// Force the contact address to the head-office address
pub fn sync_contact_address(company: &CompanyInfo) -> Option<CompanyInfo> {
    if company.contact_address.as_ref() == Some(&company.head_office_address) {
        return None;
    }
    let mut company = company.clone();
    company.contact_address = Some(company.head_office_address.clone());
    Some(company)
}

/// Make the first location sit at `head_office`, creating a seeded location
/// when there is none. A complete contact becomes the new location's
/// contact person.
pub fn sync_operating_address(
    locations: &[BusinessLocation],
    head_office: &Address,
    contact: &ContactInfo,
) -> Option<Vec<BusinessLocation>> {
    match locations.first() {
        None => {
            let mut location = BusinessLocation::seeded(head_office.clone());
            if contact.is_basic_complete() {
                location.contact_person = contact.as_contact_person();
            }
            Some(vec![location])
        }
        Some(first) if first.address == *head_office => None,
        Some(_) => {
            let mut locations = locations.to_vec();
            locations[0].address = head_office.clone();
            Some(locations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_office() -> Address {
        Address {
            street: "Masarykova 1".into(),
            city: "Brno".into(),
            zip_code: "60200".into(),
            ..Default::default()
        }
    }

    #[test]
    fn contact_address_follows_head_office() {
        let company = CompanyInfo {
            head_office_address: head_office(),
            contact_address_same_as_main: true,
            ..Default::default()
        };
        let synced = sync_contact_address(&company).unwrap();
        assert_eq!(synced.contact_address, Some(head_office()));
        assert!(sync_contact_address(&synced).is_none());
    }

    #[test]
    fn creates_seeded_location_when_none() {
        let locations = sync_operating_address(&[], &head_office(), &ContactInfo::default()).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].address, head_office());
        assert_eq!(locations[0].bank_accounts.len(), 1);
        assert_eq!(locations[0].opening_hours_detailed.len(), 7);
        assert!(locations[0].contact_person.is_empty());
    }

    #[test]
    fn overwrites_only_first_location() {
        let other = Address {
            street: "Jinde 3".into(),
            ..head_office()
        };
        let existing = vec![
            BusinessLocation::seeded(other.clone()),
            BusinessLocation::seeded(other.clone()),
        ];
        let locations =
            sync_operating_address(&existing, &head_office(), &ContactInfo::default()).unwrap();
        assert_eq!(locations[0].address, head_office());
        assert_eq!(locations[0].id, existing[0].id);
        assert_eq!(locations[1].address, other);
        assert!(sync_operating_address(&locations, &head_office(), &ContactInfo::default()).is_none());
    }
}
