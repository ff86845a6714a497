// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

// Property tests for inheritance and rule removal

use dotacl::{Acl, ResourceTarget, Targets};
use proptest::prelude::*;

/// Parent lists for `n` roles where role `i` may only inherit from roles `< i`
fn role_dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..12).prop_flat_map(|n| (0..n).map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3))).collect::<Vec<_>>())
}

/// Parent index for `n` resources where resource `i` hangs below a resource `< i`
fn resource_tree() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..12).prop_flat_map(|n| (0..n).map(|i| if i == 0 { Just(None).boxed() } else { proptest::option::of(0..i).boxed() }).collect::<Vec<_>>())
}

fn role_name(i: usize) -> String {
    format!("role-{i}")
}

fn resource_name(i: usize) -> String {
    format!("res-{i}")
}

fn build_roles(acl: &mut Acl, dag: &[Vec<usize>]) {
    for (i, parents) in dag.iter().enumerate() {
        let names: Vec<String> = parents.iter().filter(|&&p| p < i).map(|&p| role_name(p)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        acl.add_role(&role_name(i), &names).unwrap();
    }
}

fn build_resources(acl: &mut Acl, tree: &[Option<usize>]) {
    for (i, parent) in tree.iter().enumerate() {
        let parent = parent.map(resource_name);
        acl.add_resource(&resource_name(i), parent.as_deref()).unwrap();
    }
}

proptest! {
    #[test]
    fn prop_allow_reaches_exactly_descendant_roles(dag in role_dag(), target in 0usize..12) {
        let target = target % dag.len();
        let mut acl = Acl::new();
        build_roles(&mut acl, &dag);
        acl.add_resource("doc", None).unwrap();
        acl.allow(role_name(target), "doc", Targets::All, None).unwrap();

        for i in 0..dag.len() {
            let role = role_name(i);
            let expected = i == target || acl.inherits_role(&role, &role_name(target), false).unwrap();
            prop_assert_eq!(acl.is_allowed(Some(role.as_str()), "doc", Some("read")).unwrap(), expected);
            prop_assert_eq!(acl.is_allowed(Some(role.as_str()), "doc", None).unwrap(), expected);
        }
    }

    #[test]
    fn prop_allow_reaches_exactly_subtree(tree in resource_tree(), target in 0usize..12) {
        let target = target % tree.len();
        let mut acl = Acl::new();
        acl.add_role("member", &[]).unwrap();
        build_resources(&mut acl, &tree);
        acl.allow("member", resource_name(target), "edit", None).unwrap();

        for i in 0..tree.len() {
            let resource = resource_name(i);
            let expected = i == target || acl.inherits_resource(resource.as_str(), resource_name(target).as_str(), false).unwrap();
            prop_assert_eq!(acl.is_allowed(Some("member"), resource.as_str(), Some("edit")).unwrap(), expected);
        }
    }

    #[test]
    fn prop_removing_unwritten_rules_changes_nothing(
        dag in role_dag(),
        tree in resource_tree(),
        rules in proptest::collection::vec((any::<bool>(), 0usize..12, 0usize..12, 0usize..3), 0..10),
    ) {
        let mut acl = Acl::new();
        build_roles(&mut acl, &dag);
        build_resources(&mut acl, &tree);

        let privileges = ["read", "write", "delete"];
        for (allow, role, resource, privilege) in &rules {
            let role = role_name(role % dag.len());
            let resource = resource_name(resource % tree.len());
            if *allow {
                acl.allow(role, resource, privileges[*privilege], None).unwrap();
            } else {
                acl.deny(role, resource, privileges[*privilege], None).unwrap();
            }
        }

        let decide = |acl: &Acl| -> Vec<bool> {
            let mut decisions = Vec::new();
            for i in 0..dag.len() {
                let role = role_name(i);
                decisions.push(acl.is_allowed(Some(role.as_str()), ResourceTarget::All, None).unwrap());
                for j in 0..tree.len() {
                    let resource = resource_name(j);
                    for privilege in privileges {
                        decisions.push(acl.is_allowed(Some(role.as_str()), resource.as_str(), Some(privilege)).unwrap());
                    }
                }
            }
            decisions
        };

        let before = decide(&acl);
        acl.remove_allow(Targets::All, Targets::All, "publish").unwrap();
        acl.remove_deny(Targets::All, Targets::All, "publish").unwrap();
        for i in 0..dag.len() {
            acl.remove_allow(role_name(i), Targets::All, "archive").unwrap();
        }
        prop_assert_eq!(before, decide(&acl));
    }
}
