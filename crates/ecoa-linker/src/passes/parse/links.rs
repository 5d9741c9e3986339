//! Link Index - declared endpoints of one component implementation.
//!
//! Built once from the implementation's event, request and data link
//! declarations. Every declaration is indexed in both directions in the
//! same step:
//!
//! ```text
//! event link { senders: [S1, S2], receivers: [R1] }
//!
//! event_senders:   S1 -> [R1]      S2 -> [R1]
//! event_receivers: R1 -> [S1, S2]
//! ```
//!
//! An endpoint declared by several links keeps one entry whose opposite
//! list is the union of every declaration, in declaration order.

use indexmap::IndexMap;

use ecoa_core::decl::{ComponentImplDecl, EndpointDecl, EndpointGroupDecl};
use ecoa_core::{Link, LinkKind, LinkMap};

/// Declared endpoints of a component implementation, indexed both ways.
#[derive(Debug, Default)]
pub struct LinkIndex {
    pub event_senders: LinkMap,
    pub event_receivers: LinkMap,
    pub request_clients: LinkMap,
    pub request_servers: LinkMap,
    pub data_writers: LinkMap,
    pub data_readers: LinkMap,
    /// Writer endpoint -> indices of the data links declaring it.
    writer_groups: IndexMap<Link, Vec<usize>>,
}

impl LinkIndex {
    pub fn build(component: &ComponentImplDecl) -> Self {
        let mut index = Self::default();

        for link in &component.event_links {
            let senders = endpoints(&link.senders, |kind, e| {
                let link = Link::new(kind, &e.instance_name, &e.operation_name)
                    .with_activating(e.activating.unwrap_or(true));
                match &e.language {
                    Some(language) => link.with_language(language),
                    None => link,
                }
            });
            let receivers = endpoints(&link.receivers, |kind, e| {
                Link::new(kind, &e.instance_name, &e.operation_name)
                    .with_activating(e.activating.unwrap_or(true))
            });
            if senders.is_empty() || receivers.is_empty() {
                continue;
            }
            record(&mut index.event_senders, &senders, &receivers);
            record(&mut index.event_receivers, &receivers, &senders);
        }

        for link in &component.request_links {
            let clients = endpoints(&link.clients, activating_endpoint);
            // A request link has exactly one server: the first declared endpoint.
            let Some(server) = endpoints(&link.server, activating_endpoint)
                .into_iter()
                .next()
            else {
                continue;
            };
            if clients.is_empty() {
                continue;
            }
            let server = [server];
            record(&mut index.request_clients, &clients, &server);
            record(&mut index.request_servers, &server, &clients);
        }

        for (group, link) in component.data_links.iter().enumerate() {
            let controlled = link.controlled;
            let writers = endpoints(&link.writers, |kind, e| {
                Link::new(kind, &e.instance_name, &e.operation_name).with_controlled(controlled)
            });
            let readers = endpoints(&link.readers, |kind, e| {
                activating_endpoint(kind, e).with_controlled(controlled)
            });
            if writers.is_empty() || readers.is_empty() {
                continue;
            }
            record(&mut index.data_writers, &writers, &readers);
            record(&mut index.data_readers, &readers, &writers);
            for writer in writers {
                let groups = index.writer_groups.entry(writer).or_default();
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
        }

        index
    }

    /// Module-instance endpoints of `operation` on any of `instances`.
    pub fn select(map: &LinkMap, instances: &[&str], operation: &str) -> LinkMap {
        map.iter()
            .filter(|(own, _)| {
                own.kind == LinkKind::ModuleInstance
                    && own.operation_name == operation
                    && instances.contains(&own.instance_name.as_str())
            })
            .map(|(own, opposite)| (own.clone(), opposite.clone()))
            .collect()
    }

    /// Endpoints of `kind` on the instance `instance`, whatever the operation.
    pub fn select_instance(map: &LinkMap, kind: LinkKind, instance: &str) -> LinkMap {
        map.iter()
            .filter(|(own, _)| own.kind == kind && own.instance_name == instance)
            .map(|(own, opposite)| (own.clone(), opposite.clone()))
            .collect()
    }

    /// Other write ports of the same module instance sharing a data link
    /// with `writer`.
    pub fn siblings(&self, writer: &Link) -> Vec<Link> {
        let Some(groups) = self.writer_groups.get(writer) else {
            return Vec::new();
        };
        self.writer_groups
            .iter()
            .filter(|(other, other_groups)| {
                *other != writer
                    && other.instance_name == writer.instance_name
                    && other.operation_name != writer.operation_name
                    && other_groups.iter().any(|g| groups.contains(g))
            })
            .map(|(other, _)| other.clone())
            .collect()
    }
}

fn activating_endpoint(kind: LinkKind, e: &EndpointDecl) -> Link {
    Link::new(kind, &e.instance_name, &e.operation_name)
        .with_activating(e.activating.unwrap_or(true))
}

fn endpoints(group: &EndpointGroupDecl, build: impl Fn(LinkKind, &EndpointDecl) -> Link) -> Vec<Link> {
    group
        .iter()
        .flat_map(|(&kind, list)| list.iter().map(move |e| (kind, e)))
        .map(|(kind, e)| build(kind, e))
        .collect()
}

/// Index `own` endpoints against `opposite`, merging repeated declarations.
fn record(map: &mut LinkMap, own: &[Link], opposite: &[Link]) {
    for link in own {
        let entry = map.entry(link.clone()).or_default();
        for other in opposite {
            if !entry.contains(other) {
                entry.push(other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoa_core::decl::{DataLinkDecl, EventLinkDecl, RequestLinkDecl};

    fn ep(instance: &str, operation: &str) -> EndpointDecl {
        EndpointDecl {
            instance_name: instance.into(),
            operation_name: operation.into(),
            ..Default::default()
        }
    }

    fn group(kind: LinkKind, endpoints: Vec<EndpointDecl>) -> EndpointGroupDecl {
        [(kind, endpoints)].into_iter().collect()
    }

    fn event(senders: Vec<EndpointDecl>, receivers: Vec<EndpointDecl>) -> EventLinkDecl {
        EventLinkDecl {
            senders: group(LinkKind::ModuleInstance, senders),
            receivers: group(LinkKind::ModuleInstance, receivers),
        }
    }

    #[test]
    fn events_indexed_both_ways() {
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![event(vec![ep("M1", "E"), ep("M3", "E")], vec![ep("M2", "E")])],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        assert_eq!(index.event_senders.len(), 2);
        let receivers = &index.event_senders[&Link::new(LinkKind::ModuleInstance, "M1", "E")];
        assert_eq!(receivers, &vec![Link::new(LinkKind::ModuleInstance, "M2", "E")]);
        let senders = &index.event_receivers[&Link::new(LinkKind::ModuleInstance, "M2", "E")];
        assert_eq!(senders.len(), 2);
        assert_eq!(senders[0].activating, Some(true));
    }

    #[test]
    fn repeated_endpoint_merges_opposites() {
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![
                event(vec![ep("M1", "E")], vec![ep("M2", "E")]),
                event(vec![ep("M1", "E")], vec![ep("M3", "E"), ep("M2", "E")]),
            ],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        let receivers = &index.event_senders[&Link::new(LinkKind::ModuleInstance, "M1", "E")];
        let names: Vec<_> = receivers.iter().map(|l| l.instance_name.as_str()).collect();
        assert_eq!(names, vec!["M2", "M3"]);
    }

    #[test]
    fn one_sided_declaration_ignored() {
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![event(vec![ep("M1", "E")], vec![])],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        assert!(index.event_senders.is_empty());
        assert!(index.event_receivers.is_empty());
    }

    #[test]
    fn external_language_lowercased() {
        let mut external = ep("", "start");
        external.language = Some("C++".into());
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![EventLinkDecl {
                senders: group(LinkKind::External, vec![external]),
                receivers: group(LinkKind::ModuleInstance, vec![ep("M1", "start")]),
            }],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        let (own, _) = index.event_senders.get_index(0).unwrap();
        assert_eq!(own.language.as_deref(), Some("c++"));
    }

    #[test]
    fn externals_in_two_languages_stay_apart() {
        let mut c = ep("legacy", "start");
        c.language = Some("C".into());
        let mut cpp = ep("legacy", "start");
        cpp.language = Some("C++".into());
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![EventLinkDecl {
                senders: group(LinkKind::External, vec![c, cpp]),
                receivers: group(LinkKind::ModuleInstance, vec![ep("M1", "start")]),
            }],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        let languages: Vec<_> = index
            .event_senders
            .keys()
            .map(|own| own.language.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(languages, vec!["c", "c++"]);
        assert_eq!(index.event_receivers[0].len(), 2);
    }

    #[test]
    fn request_server_is_first_endpoint() {
        let component = ComponentImplDecl {
            name: "C".into(),
            request_links: vec![RequestLinkDecl {
                clients: group(LinkKind::ModuleInstance, vec![ep("M1", "Q"), ep("M2", "Q")]),
                server: group(LinkKind::ModuleInstance, vec![ep("M3", "Q"), ep("M4", "Q")]),
            }],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        assert_eq!(index.request_servers.len(), 1);
        assert_eq!(index.request_servers[0].len(), 2);
        let server = &index.request_clients[&Link::new(LinkKind::ModuleInstance, "M2", "Q")];
        assert_eq!(server, &vec![Link::new(LinkKind::ModuleInstance, "M3", "Q")]);
    }

    #[test]
    fn data_siblings_share_a_group() {
        let component = ComponentImplDecl {
            name: "C".into(),
            data_links: vec![
                DataLinkDecl {
                    writers: group(LinkKind::ModuleInstance, vec![ep("M1", "W1"), ep("M1", "W2")]),
                    readers: group(LinkKind::ModuleInstance, vec![ep("M2", "R")]),
                    controlled: false,
                },
                DataLinkDecl {
                    writers: group(LinkKind::ModuleInstance, vec![ep("M1", "W3")]),
                    readers: group(LinkKind::ModuleInstance, vec![ep("M2", "R2")]),
                    controlled: true,
                },
            ],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        let w1 = Link::new(LinkKind::ModuleInstance, "M1", "W1");
        assert_eq!(
            index.siblings(&w1),
            vec![Link::new(LinkKind::ModuleInstance, "M1", "W2")]
        );
        let w3 = Link::new(LinkKind::ModuleInstance, "M1", "W3");
        assert!(index.siblings(&w3).is_empty());
        let (reader, _) = index.data_readers.get_index(0).unwrap();
        assert_eq!(reader.controlled, Some(false));
    }

    #[test]
    fn select_by_instances_and_operation() {
        let component = ComponentImplDecl {
            name: "C".into(),
            event_links: vec![event(vec![ep("M1", "E"), ep("M2", "E"), ep("M1", "F")], vec![ep("M9", "E")])],
            ..Default::default()
        };
        let index = LinkIndex::build(&component);
        let selected = LinkIndex::select(&index.event_senders, &["M1", "M2"], "E");
        assert_eq!(selected.len(), 2);
        let none = LinkIndex::select_instance(&index.event_senders, LinkKind::Trigger, "M1");
        assert!(none.is_empty());
    }
}
