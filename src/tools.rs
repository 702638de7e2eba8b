/// External converter discovery.
///
/// The probe runs once at startup and the resulting capability set is
/// read-only for the rest of the run. A missing tool is never an error
/// by itself; it only narrows which pipeline chains are selectable.
use std::fmt;

/// The external binaries the conversion pipelines know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalTool {
    Avifenc,
    Avifdec,
    Dwebp,
    Cwebp,
    Sips,
    Magick,
}

impl ExternalTool {
    pub const ALL: [ExternalTool; 6] = [
        ExternalTool::Avifenc,
        ExternalTool::Avifdec,
        ExternalTool::Dwebp,
        ExternalTool::Cwebp,
        ExternalTool::Sips,
        ExternalTool::Magick,
    ];

    pub fn binary_name(&self) -> &'static str {
        match self {
            ExternalTool::Avifenc => "avifenc",
            ExternalTool::Avifdec => "avifdec",
            ExternalTool::Dwebp => "dwebp",
            ExternalTool::Cwebp => "cwebp",
            ExternalTool::Sips => "sips",
            ExternalTool::Magick => "magick",
        }
    }
}

impl fmt::Display for ExternalTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_name())
    }
}

/// Set of external tools confirmed invocable on this host, plus the
/// always-present image library fallback.
#[derive(Debug, Clone, Default)]
pub struct ToolCapability {
    present: Vec<ExternalTool>,
}

impl ToolCapability {
    /// Probe the host PATH for every known tool. Called once per run.
    pub fn probe() -> Self {
        let present = ExternalTool::ALL
            .into_iter()
            .filter(|tool| which::which(tool.binary_name()).is_ok())
            .collect();
        Self { present }
    }

    /// Capability set with an explicit tool list, for chain selection tests.
    pub fn with_tools(tools: &[ExternalTool]) -> Self {
        Self {
            present: tools.to_vec(),
        }
    }

    pub fn has(&self, tool: ExternalTool) -> bool {
        self.present.contains(&tool)
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn available(&self) -> &[ExternalTool] {
        &self.present
    }

    /// Binary names of every probed tool, for the run report.
    pub fn names(&self) -> Vec<&'static str> {
        self.present.iter().map(|t| t.binary_name()).collect()
    }
}

pub fn print_probe_result(caps: &ToolCapability) {
    for tool in ExternalTool::ALL {
        if caps.has(tool) {
            crate::info!("✅ found {}", tool);
        } else {
            crate::info!("❌ missing {}", tool);
        }
    }
    crate::info!("📚 image library fallback: always available");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_tools_membership() {
        let caps = ToolCapability::with_tools(&[ExternalTool::Avifenc, ExternalTool::Sips]);
        assert!(caps.has(ExternalTool::Avifenc));
        assert!(caps.has(ExternalTool::Sips));
        assert!(!caps.has(ExternalTool::Dwebp));
        assert!(!caps.is_empty());
    }

    #[test]
    fn test_empty_capability_set() {
        let caps = ToolCapability::with_tools(&[]);
        assert!(caps.is_empty());
        for tool in ExternalTool::ALL {
            assert!(!caps.has(tool));
        }
    }

    #[test]
    fn test_binary_names() {
        assert_eq!(ExternalTool::Avifenc.binary_name(), "avifenc");
        assert_eq!(ExternalTool::Dwebp.binary_name(), "dwebp");
        assert_eq!(ExternalTool::Magick.to_string(), "magick");
    }

    #[test]
    fn test_probe_does_not_panic() {
        // Result depends on the host; only the contract matters.
        let caps = ToolCapability::probe();
        let _ = caps.names();
    }

    #[test]
    fn test_names_match_present_tools() {
        let caps = ToolCapability::with_tools(&[ExternalTool::Cwebp]);
        assert_eq!(caps.names(), vec!["cwebp"]);
    }
}
