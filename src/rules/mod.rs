//! Rule tables: declarative keyword, category and pattern rules that drive
//! signal extraction.

pub mod registry;
pub mod types;

pub use registry::{bundled, bundled_source, global, init_rules, install, load_from_path, resolve};
pub use types::{
    render_template, ActivityWindow, AxisRule, BehaviorRules, CadenceRule, CommunityPattern,
    LabelRule, PoleRule, RuleTable, TextMarker,
};
