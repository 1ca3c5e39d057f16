//! GraphML street network loader.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use tn_graph::load_graphml;
//!
//! let network = load_graphml(Path::new("data/manhatten.graphml"))?;
//! ```
//!
//! # What is loaded
//!
//! The format written by OSMnx / NetworkX:
//!
//! ```xml
//! <key id="d4" for="node" attr.name="x" attr.type="string"/>
//! <key id="d9" for="edge" attr.name="length" attr.type="string"/>
//! <graph edgedefault="directed">
//!   <node id="42421728"><data key="d4">-73.9600</data>…</node>
//!   <edge source="42421728" target="42432736"><data key="d9">85.2</data></edge>
//! </graph>
//! ```
//!
//! | Element | Required data        | Used as                         |
//! |---------|----------------------|---------------------------------|
//! | node    | `x`, `y`, `osmid`    | longitude, latitude, OSM id     |
//! | edge    | `length`             | metres                          |
//!
//! Every other attribute is ignored.  Nodes get dense indices in document
//! order.  Edges are resolved after the whole document has been read, so
//! they may reference nodes declared further down.  `edgedefault="undirected"`
//! (or `directed="false"` on a single edge) adds both directions.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rustc_hash::FxHashMap;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

use tn_core::GeoPoint;

use crate::network::{StreetNetwork, StreetNetworkBuilder};
use crate::{GraphError, GraphResult};

// ── Public entry points ───────────────────────────────────────────────────────

/// Load a street network from a GraphML file.
///
/// # Errors
///
/// - [`GraphError::Io`] / [`GraphError::Xml`] if the file is missing or not
///   well-formed XML.
/// - [`GraphError::MissingAttribute`] / [`GraphError::InvalidNumber`] for
///   nodes without coordinates or edges without a usable length.
/// - [`GraphError::UnknownNode`] / [`GraphError::DuplicateNode`] for broken
///   node references.
pub fn load_graphml(path: &Path) -> GraphResult<StreetNetwork> {
    let started = Instant::now();
    let file = File::open(path)?;
    let network = load_graphml_reader(file)?;
    info!(
        "loaded {}: {} nodes, {} edges in {:.2?}",
        path.display(),
        network.node_count(),
        network.edge_count(),
        started.elapsed(),
    );
    Ok(network)
}

/// Like [`load_graphml`] but accepts any `Read` source.
pub fn load_graphml_reader<R: Read>(reader: R) -> GraphResult<StreetNetwork> {
    let parsed = parse_document(reader)?;
    assemble(parsed)
}

// ── Document parsing ──────────────────────────────────────────────────────────

struct PendingNode {
    id:   String,
    data: FxHashMap<String, String>,
}

struct PendingEdge {
    source:   String,
    target:   String,
    directed: bool,
    data:     FxHashMap<String, String>,
}

enum Open {
    Node(PendingNode),
    Edge(PendingEdge),
}

impl Open {
    fn data_mut(&mut self) -> &mut FxHashMap<String, String> {
        match self {
            Open::Node(n) => &mut n.data,
            Open::Edge(e) => &mut e.data,
        }
    }
}

struct ParsedDocument {
    nodes: Vec<PendingNode>,
    edges: Vec<PendingEdge>,
}

fn parse_document<R: Read>(reader: R) -> GraphResult<ParsedDocument> {
    // key id → attr.name
    let mut keys: FxHashMap<String, String> = FxHashMap::default();
    let mut directed_default = true;

    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let mut open: Option<Open> = None;
    let mut data_key: Option<String> = None;
    let mut text = String::new();

    for event in EventReader::new(BufReader::new(reader)) {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => match name.local_name.as_str() {
                "key" => {
                    let id = required(&attributes, "key", "?", "id")?;
                    let attr_name = attr(&attributes, "attr.name").unwrap_or(id);
                    keys.insert(id.to_owned(), attr_name.to_owned());
                }
                "graph" => {
                    directed_default = attr(&attributes, "edgedefault") != Some("undirected");
                }
                "node" => {
                    let id = required(&attributes, "node", "?", "id")?;
                    open = Some(Open::Node(PendingNode {
                        id:   id.to_owned(),
                        data: FxHashMap::default(),
                    }));
                }
                "edge" => {
                    let source = required(&attributes, "edge", "?", "source")?;
                    let target = required(&attributes, "edge", source, "target")?;
                    let directed = match attr(&attributes, "directed") {
                        Some(flag) => flag != "false",
                        None => directed_default,
                    };
                    open = Some(Open::Edge(PendingEdge {
                        source: source.to_owned(),
                        target: target.to_owned(),
                        directed,
                        data: FxHashMap::default(),
                    }));
                }
                "data" if open.is_some() => {
                    data_key = attr(&attributes, "key").map(str::to_owned);
                    text.clear();
                }
                _ => {}
            },
            XmlEvent::Characters(chunk) | XmlEvent::CData(chunk) => {
                if data_key.is_some() {
                    text.push_str(&chunk);
                }
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "data" => {
                    if let (Some(key), Some(element)) = (data_key.take(), open.as_mut()) {
                        match keys.get(&key) {
                            Some(attr_name) => {
                                element.data_mut().insert(attr_name.clone(), text.trim().to_owned());
                            }
                            None => debug!("ignoring data with undeclared key {key:?}"),
                        }
                    }
                }
                "node" | "edge" => match open.take() {
                    Some(Open::Node(n)) => nodes.push(n),
                    Some(Open::Edge(e)) => edges.push(e),
                    None => {}
                },
                _ => {}
            },
            _ => {}
        }
    }

    Ok(ParsedDocument { nodes, edges })
}

// ── Network assembly ──────────────────────────────────────────────────────────

fn assemble(doc: ParsedDocument) -> GraphResult<StreetNetwork> {
    let mut builder = StreetNetworkBuilder::new();

    for node in doc.nodes {
        let x = parse_f64(node_attr(&node, "x")?, "x")?;
        let y = parse_f64(node_attr(&node, "y")?, "y")?;
        let osmid_text = node_attr(&node, "osmid")?;
        let osmid = osmid_text
            .parse::<i64>()
            .map_err(|_| GraphError::InvalidNumber { attr: "osmid", value: osmid_text.to_owned() })?;
        builder.add_node(node.id, GeoPoint::new(x, y), osmid)?;
    }

    for edge in &doc.edges {
        let from = builder
            .lookup(&edge.source)
            .ok_or_else(|| GraphError::UnknownNode(edge.source.clone()))?;
        let to = builder
            .lookup(&edge.target)
            .ok_or_else(|| GraphError::UnknownNode(edge.target.clone()))?;

        let length_text = edge.data.get("length").ok_or_else(|| GraphError::MissingAttribute {
            element: "edge",
            id:      format!("{}->{}", edge.source, edge.target),
            attr:    "length",
        })?;
        let length_m = parse_f64(length_text, "length")?;
        if length_m < 0.0 {
            return Err(GraphError::InvalidNumber { attr: "length", value: length_text.clone() });
        }

        if edge.directed {
            builder.add_directed_edge(from, to, length_m);
        } else {
            builder.add_road(from, to, length_m);
        }
    }

    Ok(builder.build())
}

// ── Attribute helpers ─────────────────────────────────────────────────────────

fn attr<'a>(attributes: &'a [OwnedAttribute], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name.local_name == key)
        .map(|a| a.value.as_str())
}

fn required<'a>(
    attributes: &'a [OwnedAttribute],
    element:    &'static str,
    id:         &str,
    key:        &'static str,
) -> GraphResult<&'a str> {
    attr(attributes, key).ok_or_else(|| GraphError::MissingAttribute {
        element,
        id: id.to_owned(),
        attr: key,
    })
}

fn node_attr<'a>(node: &'a PendingNode, key: &'static str) -> GraphResult<&'a str> {
    node.data
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| GraphError::MissingAttribute { element: "node", id: node.id.clone(), attr: key })
}

fn parse_f64(text: &str, attr: &'static str) -> GraphResult<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GraphError::InvalidNumber { attr, value: text.to_owned() })
}
