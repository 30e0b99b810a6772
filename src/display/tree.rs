//! Indented tree rendering of a hierarchy.

use super::theme::Theme;
use crate::hierarchy::Hierarchy;
use crate::resource::{Resource, ResourceKind};

/// Options for [`render_tree`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
    /// Deepest level shown; organizations' direct children are level 1
    pub level: Option<usize>,
    /// Append resource names to labels
    pub show_ids: bool,
}

const ORGANIZATIONLESS_LABEL: &str = "(organizationless)";

fn label(theme: &Theme, resource: &Resource<'_>, show_ids: bool) -> String {
    let style = match resource.kind() {
        ResourceKind::Organization => &theme.organization,
        ResourceKind::Folder => &theme.folder,
        ResourceKind::Project => &theme.project,
    };
    let mut text = theme.apply(style, resource.display_name());
    if show_ids {
        text.push(' ');
        text.push_str(&theme.apply(&theme.dim, format!("({})", resource.name())));
    }
    text
}

fn render_children(
    hierarchy: &Hierarchy,
    theme: &Theme,
    options: TreeOptions,
    children: &[Resource<'_>],
    depth: usize,
    prefix: &str,
    out: &mut String,
) {
    if options.level.is_some_and(|max| depth > max) {
        return;
    }
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&label(theme, child, options.show_ids));
        out.push('\n');

        let grandchildren = hierarchy.direct_children_of(&child.name()).unwrap_or_default();
        if !grandchildren.is_empty() {
            let next_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_children(hierarchy, theme, options, &grandchildren, depth + 1, &next_prefix, out);
        }
    }
}

/// Render every organization, then organizationless projects, as a tree
pub fn render_tree(hierarchy: &Hierarchy, theme: &Theme, options: TreeOptions) -> String {
    let mut out = String::new();

    for org in hierarchy.organizations() {
        let root = Resource::Organization(org);
        out.push_str(&label(theme, &root, options.show_ids));
        out.push('\n');
        let children = hierarchy.direct_children_of(&org.name).unwrap_or_default();
        render_children(hierarchy, theme, options, &children, 1, "", &mut out);
    }

    let orphans: Vec<Resource<'_>> = hierarchy
        .organizationless_projects()
        .into_iter()
        .map(Resource::Project)
        .collect();
    if !orphans.is_empty() {
        out.push_str(&theme.apply(&theme.warning, ORGANIZATIONLESS_LABEL));
        out.push('\n');
        render_children(hierarchy, theme, options, &orphans, 1, "", &mut out);
    }

    out
}
