use crate::models::DayId;
use crate::status::Status;
use scraper::{ElementRef, Html};
use tracing::warn;

pub const DAY_ID_ATTR: &str = "data-day-id";
pub const STATUS_ATTR: &str = "data-status";

/// Handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// View-model bound to a rendered day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day_id: DayId,
    /// `None` when the markup carried no status, or one outside the cycle.
    pub status: Option<Status>,
}

impl DayCell {
    pub fn class_name(&self) -> String {
        match self.status {
            Some(status) => format!("day {status}"),
            None => "day".to_string(),
        }
    }
}

/// What a `data-day-id` attribute bound to an element.
#[derive(Debug, Clone)]
enum Marker {
    Cell(DayCell),
    /// The id was not an integer. The element still claims clicks inside it.
    Malformed(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    html_id: Option<String>,
    parent: Option<NodeId>,
    marker: Option<Marker>,
}

impl Element {
    fn cell(&self) -> Option<&DayCell> {
        match &self.marker {
            Some(Marker::Cell(cell)) => Some(cell),
            _ => None,
        }
    }
}

/// Element tree of a rendered calendar page.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Document::default();
        document.collect(parsed.root_element(), None);
        document
    }

    fn collect(&mut self, element: ElementRef<'_>, parent: Option<NodeId>) {
        let value = element.value();
        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            tag: value.name().to_string(),
            html_id: value.id().map(str::to_string),
            parent,
            marker: read_marker(element),
        });

        for child in element.children() {
            if let Some(child) = ElementRef::wrap(child) {
                self.collect(child, Some(id));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node.0).map(|element| element.tag.as_str())
    }

    pub fn find_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|element| element.html_id.as_deref() == Some(html_id))
            .map(NodeId)
    }

    /// The cell bound to `node`, if its marker carried a valid day id.
    pub fn cell(&self, node: NodeId) -> Option<&DayCell> {
        self.elements.get(node.0)?.cell()
    }

    /// Raw id of a marker whose `data-day-id` was not an integer.
    pub fn malformed_id(&self, node: NodeId) -> Option<&str> {
        match &self.elements.get(node.0)?.marker {
            Some(Marker::Malformed(raw)) => Some(raw),
            _ => None,
        }
    }

    pub fn cell_by_day(&self, day_id: DayId) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|element| element.cell().is_some_and(|cell| cell.day_id == day_id))
            .map(NodeId)
    }

    pub fn cells(&self) -> impl Iterator<Item = (NodeId, &DayCell)> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| element.cell().map(|cell| (NodeId(index), cell)))
    }

    /// Nearest element carrying `data-day-id` at or above `node`. The
    /// search stops there even when the id is malformed; check with
    /// [`Document::cell`].
    pub fn closest_cell(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let element = self.elements.get(id.0)?;
            if element.marker.is_some() {
                return Some(id);
            }
            current = element.parent;
        }
        None
    }

    /// Returns false when `node` is not a day cell.
    pub fn set_status(&mut self, node: NodeId, status: Status) -> bool {
        match self.elements.get_mut(node.0).and_then(|element| element.marker.as_mut()) {
            Some(Marker::Cell(cell)) => {
                cell.status = Some(status);
                true
            }
            _ => false,
        }
    }
}

fn read_marker(element: ElementRef<'_>) -> Option<Marker> {
    let raw_id = element.value().attr(DAY_ID_ATTR)?;
    let day_id = match raw_id.trim().parse::<i64>() {
        Ok(value) => DayId(value),
        Err(_) => {
            warn!("day cell with non-numeric id '{raw_id}' will ignore clicks");
            return Some(Marker::Malformed(raw_id.to_string()));
        }
    };
    let status = element
        .value()
        .attr(STATUS_ATTR)
        .and_then(|raw| raw.parse().ok());
    Some(Marker::Cell(DayCell { day_id, status }))
}
