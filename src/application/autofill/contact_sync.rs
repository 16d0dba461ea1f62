//! Derivation of persons and location contacts from the contact info

use crate::domain::onboarding::{
    ActualOwner, AuthorizedPerson, BusinessLocation, Consents, ContactInfo,
};

/// Authorized persons after reconciling them with `contact`.
///
/// Returns the new list and the id of a freshly created person, or `None`
/// when nothing had to change. A person derived from `previous` follows the
/// contact instead of a second one being created.
pub fn sync_authorized_persons(
    persons: &[AuthorizedPerson],
    previous: Option<&ContactInfo>,
    contact: &ContactInfo,
) -> Option<(Vec<AuthorizedPerson>, Option<String>)> {
    if persons.iter().any(|p| p.matches_contact(contact)) {
        return None;
    }

    let mut persons = persons.to_vec();
    let follower = previous.and_then(|previous| {
        persons
            .iter()
            .position(|p| p.created_from_contact && p.matches_contact(previous))
    });
    match follower {
        Some(index) => {
            persons[index].follow_contact(contact);
            Some((persons, None))
        }
        None => {
            let person = AuthorizedPerson::from_contact(contact);
            let id = person.id.clone();
            persons.push(person);
            Some((persons, Some(id)))
        }
    }
}

/// Same as [`sync_authorized_persons`] for beneficial owners
pub fn sync_actual_owners(
    owners: &[ActualOwner],
    previous: Option<&ContactInfo>,
    contact: &ContactInfo,
) -> Option<Vec<ActualOwner>> {
    if owners.iter().any(|o| o.matches_contact(contact)) {
        return None;
    }

    let mut owners = owners.to_vec();
    let follower = previous.and_then(|previous| {
        owners
            .iter()
            .position(|o| o.created_from_contact && o.matches_contact(previous))
    });
    match follower {
        Some(index) => owners[index].follow_contact(contact),
        None => owners.push(ActualOwner::from_contact(contact)),
    }
    Some(owners)
}

/// Point the signature at a newly derived person when no valid signer is set
pub fn default_signer(
    consents: &Consents,
    persons: &[AuthorizedPerson],
    created_id: &str,
) -> Option<Consents> {
    let valid = consents
        .signing_person_id
        .as_deref()
        .is_some_and(|id| persons.iter().any(|p| p.id == id));
    if valid {
        return None;
    }
    let mut consents = consents.clone();
    consents.signing_person_id = Some(created_id.to_string());
    Some(consents)
}

/// Copy the contact into location contact persons that were never edited
/// by hand: empty ones, and ones still equal to the previous contact.
pub fn sync_location_contacts(
    locations: &[BusinessLocation],
    previous: &ContactInfo,
    contact: &ContactInfo,
) -> Option<Vec<BusinessLocation>> {
    let before = previous.as_contact_person();
    let after = contact.as_contact_person();

    let mut changed = false;
    let locations = locations
        .iter()
        .cloned()
        .map(|mut location| {
            let untouched = location.contact_person.is_empty() || location.contact_person == before;
            if untouched && location.contact_person != after {
                location.contact_person = after.clone();
                changed = true;
            }
            location
        })
        .collect();

    changed.then_some(locations)
}
