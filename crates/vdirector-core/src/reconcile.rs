// ── Address reconciliation ──
//
// Reads merge the remote list into local state by `name`: matching entries
// are overwritten in place and unmatched remote entries are appended. Local
// entries the remote no longer reports are kept. Writes push the whole plan.

use std::collections::HashMap;

use vdirector_api::{AddressCollection, AddressObject};

use crate::model::AddressesState;

/// Merge `remote` into `target` by name.
///
/// Remote values win. The first local entry with a given name is the one
/// replaced; ordering of existing entries never changes.
pub fn merge_by_name<I>(target: &mut Vec<AddressObject>, remote: I)
where
    I: IntoIterator<Item = AddressObject>,
{
    let mut index: HashMap<String, usize> = HashMap::with_capacity(target.len());
    for (pos, item) in target.iter().enumerate() {
        index.entry(item.name.clone()).or_insert(pos);
    }

    for item in remote {
        match index.get(&item.name) {
            Some(&pos) => target[pos] = item,
            None => {
                index.insert(item.name.clone(), target.len());
                target.push(item);
            }
        }
    }
}

/// Result of merging `remote` into a copy of `desired`.
pub fn reconcile_read(desired: &[AddressObject], remote: &[AddressObject]) -> Vec<AddressObject> {
    let mut merged = desired.to_vec();
    merge_by_name(&mut merged, remote.iter().cloned());
    merged
}

/// Everything in the plan is written; there is no delta against prior state.
pub fn write_set(plan: &AddressesState) -> AddressCollection {
    plan.to_collection()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn addr(name: &str, fqdn: &str) -> AddressObject {
        AddressObject::with_fqdn(name, fqdn)
    }

    #[test]
    fn matching_entry_updated_in_place_and_new_one_appended() {
        let desired = vec![AddressObject::new("a")];
        let remote = vec![addr("a", "x"), addr("b", "y")];

        assert_eq!(
            reconcile_read(&desired, &remote),
            vec![addr("a", "x"), addr("b", "y")]
        );
    }

    #[test]
    fn local_only_entries_survive_and_keep_position() {
        let desired = vec![addr("keep", "k"), addr("a", "old"), addr("z", "z")];
        let remote = vec![addr("a", "new")];

        assert_eq!(
            reconcile_read(&desired, &remote),
            vec![addr("keep", "k"), addr("a", "new"), addr("z", "z")]
        );
    }

    #[test]
    fn empty_desired_yields_remote_in_remote_order() {
        let remote = vec![addr("c", "3"), addr("a", "1"), addr("b", "2")];
        assert_eq!(reconcile_read(&[], &remote), remote);
    }

    #[test]
    fn merging_twice_adds_no_duplicates() {
        let desired = vec![addr("a", "old"), addr("local", "l")];
        let remote = vec![addr("b", "y"), addr("a", "x")];

        let once = reconcile_read(&desired, &remote);
        let twice = reconcile_read(&once, &remote);

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 3);
    }

    #[test]
    fn only_first_duplicate_local_name_is_replaced() {
        let mut target = vec![addr("a", "1"), addr("a", "2")];
        merge_by_name(&mut target, vec![addr("a", "remote")]);
        assert_eq!(target, vec![addr("a", "remote"), addr("a", "2")]);
    }

    #[test]
    fn write_set_is_whole_plan() {
        let scope = crate::model::Scope::new("Branch-1", "ACME").unwrap();
        let plan = AddressesState::new(scope, vec![addr("a", "1"), addr("b", "2")]);
        let set = write_set(&plan);
        assert_eq!(set.device_name, "Branch-1");
        assert_eq!(set.organization_name, "ACME");
        assert_eq!(set.items, plan.addresses);
    }
}
