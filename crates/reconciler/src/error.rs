use core::error::Error;
use core::fmt;

use dom::NodeKey;

use crate::hooks::HookKind;

/// Engine conditions a caller may want to tell apart from adapter or
/// component failures. Carried inside `anyhow::Error`; recover them with
/// `downcast_ref::<RenderError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// `render` was pointed at a node the host does not know.
    InvalidTarget { container: NodeKey },
    /// A component called its hooks in a different order, count or value
    /// type than on its previous pass. `None` means "no hook at this index".
    HookOrderViolation {
        component: &'static str,
        index: usize,
        expected: Option<HookKind>,
        found: Option<HookKind>,
    },
    /// A deleted subtree owned no host node to remove.
    DetachedDeletion { component: String },
    /// An arena index pointed at a freed fiber.
    MissingFiber,
}

impl fmt::Display for RenderError {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { container } => {
                write!(out, "render target {container:?} is not a live host node")
            }
            Self::HookOrderViolation { component, index, expected, found } => match (expected, found) {
                (Some(expected), Some(found)) if expected == found => write!(
                    out,
                    "hook #{index} in {component} changed the value type of its {found}"
                ),
                (Some(expected), Some(found)) => write!(
                    out,
                    "hook #{index} in {component}: expected {expected}, found {found}"
                ),
                (Some(expected), None) => write!(
                    out,
                    "hook #{index} in {component}: expected {expected}, but the render returned first"
                ),
                (None, Some(found)) => write!(
                    out,
                    "hook #{index} in {component}: unexpected {found} beyond the previous pass"
                ),
                (None, None) => write!(out, "hook #{index} in {component} is out of order"),
            },
            Self::DetachedDeletion { component } => {
                write!(out, "deleted subtree {component} holds no host node")
            }
            Self::MissingFiber => write!(out, "fiber arena index refers to a freed node"),
        }
    }
}

impl Error for RenderError {}
