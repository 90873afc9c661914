use crate::dns::records::{a_record, aaaa_record};
use arc_swap::ArcSwapOption;
use hickory_proto::rr::{Name, Record, RecordType};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Names the mesh proxy owns and the addresses it answers with.
///
/// Built whole and published through [`LookupTableHandle`]; never mutated
/// after publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupTable {
    all_hosts: BTreeSet<String>,
    name4: BTreeMap<String, Vec<Ipv4Addr>>,
    name6: BTreeMap<String, Vec<Ipv6Addr>>,
    ttl: u32,
}

impl LookupTable {
    /// Table owning `<member>.` for every member, each mapped to the same
    /// answer addresses.
    pub fn build<'a>(
        members: impl IntoIterator<Item = &'a String>,
        ipv4: &[Ipv4Addr],
        ipv6: &[Ipv6Addr],
        ttl: u32,
    ) -> Self {
        let mut table = Self {
            ttl,
            ..Self::default()
        };

        for member in members {
            let host = normalize_host(member);
            if !ipv4.is_empty() {
                table.name4.insert(host.clone(), ipv4.to_vec());
            }
            if !ipv6.is_empty() {
                table.name6.insert(host.clone(), ipv6.to_vec());
            }
            table.all_hosts.insert(host);
        }

        table
    }

    /// Answers for `hostname`, named `question_name`.
    ///
    /// `None` means the name is not ours. An owned name without addresses of
    /// the requested type yields an empty list.
    pub fn lookup(
        &self,
        question_name: &Name,
        hostname: &str,
        record_type: RecordType,
    ) -> Option<Vec<Record>> {
        if !self.all_hosts.contains(hostname) {
            return None;
        }

        let answers = match record_type {
            RecordType::A => self
                .name4
                .get(hostname)
                .map(|ips| {
                    ips.iter()
                        .map(|ip| a_record(question_name.clone(), *ip, self.ttl))
                        .collect()
                })
                .unwrap_or_default(),
            RecordType::AAAA => self
                .name6
                .get(hostname)
                .map(|ips| {
                    ips.iter()
                        .map(|ip| aaaa_record(question_name.clone(), *ip, self.ttl))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Some(answers)
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.all_hosts.contains(hostname)
    }

    pub fn len(&self) -> usize {
        self.all_hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_hosts.is_empty()
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }
}

/// Lowercase FQDN form used as the table key.
pub fn normalize_host(name: &str) -> String {
    let mut host = name.to_ascii_lowercase();
    if !host.ends_with('.') {
        host.push('.');
    }
    host
}

/// Atomically swappable pointer to the current table. Readers get either a
/// complete table or none.
#[derive(Default)]
pub struct LookupTableHandle {
    current: ArcSwapOption<LookupTable>,
}

impl LookupTableHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Option<Arc<LookupTable>> {
        self.current.load_full()
    }

    pub fn publish(&self, table: LookupTable) {
        self.current.store(Some(Arc::new(table)));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_build_normalizes_hosts() {
        let table = LookupTable::build(
            &members(&["Svc2.NS2", "svc3.ns3."]),
            &["10.4.4.4".parse().unwrap()],
            &[],
            120,
        );

        assert_eq!(table.len(), 2);
        assert!(table.contains("svc2.ns2."));
        assert!(table.contains("svc3.ns3."));
    }

    #[test]
    fn test_lookup_owned_name_without_family_is_empty() {
        let table = LookupTable::build(
            &members(&["svc2.ns2"]),
            &["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()],
            &[],
            120,
        );
        let name = Name::from_ascii("svc2.ns2.mesh.").unwrap();

        let a = table.lookup(&name, "svc2.ns2.", RecordType::A).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].ttl(), 120);
        assert_eq!(a[0].name(), &name);

        let aaaa = table.lookup(&name, "svc2.ns2.", RecordType::AAAA).unwrap();
        assert!(aaaa.is_empty());
    }

    #[test]
    fn test_lookup_foreign_name_is_none() {
        let table = LookupTable::build(&members(&["svc2.ns2"]), &[], &[], 120);
        let name = Name::from_ascii("other.ns2.").unwrap();

        assert!(table.lookup(&name, "other.ns2.", RecordType::A).is_none());
    }

    #[test]
    fn test_handle_publish_and_clear() {
        let handle = LookupTableHandle::new();
        assert!(handle.load().is_none());

        handle.publish(LookupTable::build(&members(&["a.b"]), &[], &[], 5));
        let first = handle.load().unwrap();

        handle.publish(LookupTable::build(&members(&["c.d", "e.f"]), &[], &[], 5));

        assert_eq!(first.len(), 1);
        assert_eq!(handle.load().unwrap().len(), 2);

        handle.clear();
        assert!(handle.load().is_none());
    }
}
