//! Builds the navigable category tree from flat "/"-delimited path strings.
//!
//! The input order is preserved as child order at every level; callers feed
//! in the lexicographically sorted output of
//! [`crate::schema::distinct_category_paths`], so the tree is stable for a
//! given (language, level) pair and rebuilt wholesale when either changes.

/// One node of the category taxonomy. `dataset_id` is set iff the node is a
/// leaf (a measured variable); shared path prefixes collapse into one node.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    /// Unique per (depth, joined path so far)
    pub id: String,
    pub name: String,
    /// 0-based depth
    pub level: usize,
    pub children: Vec<CategoryNode>,
    /// `ds:` + full cleaned path, present on leaves only
    pub dataset_id: Option<String>,
}

/// Build the category tree. Never fails: malformed paths degrade to an
/// empty or shallower tree.
pub fn build_tree(paths: &[String]) -> Vec<CategoryNode> {
    let mut roots: Vec<CategoryNode> = Vec::new();

    for path in paths {
        let segments: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            continue;
        }
        let full_path = segments.join("/");

        let mut children = &mut roots;
        let mut prefix = String::new();
        for (depth, segment) in segments.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            let id = node_id(depth, &prefix);

            // Reuse an existing prefix node, otherwise append in first-seen order
            let index = match children.iter().position(|n| n.id == id) {
                Some(i) => i,
                None => {
                    children.push(CategoryNode {
                        id,
                        name: (*segment).to_string(),
                        level: depth,
                        children: Vec::new(),
                        dataset_id: None,
                    });
                    children.len() - 1
                }
            };

            if depth == segments.len() - 1 {
                children[index].dataset_id = Some(format!("ds:{}", full_path));
            }
            children = &mut children[index].children;
        }
    }

    roots
}

/// Build the dataset id the tree assigns to a cleaned path, or `None` when
/// the path has no usable segments.
pub fn dataset_id_for_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("ds:{}", segments.join("/")))
}

/// Recover the category path from a dataset id
pub fn dataset_path(dataset_id: &str) -> Option<&str> {
    dataset_id.strip_prefix("ds:")
}

fn node_id(depth: usize, prefix: &str) -> String {
    format!("{}:{}", depth, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_demographics_scenario() {
        let tree = build_tree(&paths(&[
            "Demographics/Population/Total",
            "Demographics/Population/Urban",
        ]));

        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.name, "Demographics");
        assert_eq!(root.level, 0);
        assert!(root.dataset_id.is_none());
        assert_eq!(root.children.len(), 1);

        let population = &root.children[0];
        assert_eq!(population.name, "Population");
        assert_eq!(population.level, 1);
        assert_eq!(population.children.len(), 2);

        let total = &population.children[0];
        let urban = &population.children[1];
        assert_eq!(total.name, "Total");
        assert_eq!(
            total.dataset_id.as_deref(),
            Some("ds:Demographics/Population/Total")
        );
        assert!(total.children.is_empty());
        assert_eq!(
            urban.dataset_id.as_deref(),
            Some("ds:Demographics/Population/Urban")
        );
        assert!(urban.children.is_empty());
    }

    #[test]
    fn test_child_order_is_first_seen() {
        let tree = build_tree(&paths(&["B/x", "A/y", "B/a"]));
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        let b_children: Vec<&str> = tree[0].children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(b_children, vec!["x", "a"]);
    }

    #[test]
    fn test_segments_trimmed_and_empties_dropped() {
        let tree = build_tree(&paths(&[" Economy / Industry //Workers "]));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Economy");
        let industry = &tree[0].children[0];
        assert_eq!(industry.name, "Industry");
        let workers = &industry.children[0];
        assert_eq!(workers.name, "Workers");
        assert_eq!(
            workers.dataset_id.as_deref(),
            Some("ds:Economy/Industry/Workers")
        );
    }

    #[test]
    fn test_degenerate_paths_contribute_nothing() {
        assert!(build_tree(&paths(&["", "  ", "///", " / / "])).is_empty());
    }

    #[test]
    fn test_leaf_dataset_ids_reverse_to_full_paths() {
        let input = paths(&[
            "Economy/Agriculture/Land Use/Arable",
            "Economy/Agriculture/Livestock",
            "Infrastructure/Education",
        ]);
        let tree = build_tree(&input);

        fn collect_leaves(nodes: &[CategoryNode], out: &mut Vec<String>) {
            for node in nodes {
                if let Some(id) = &node.dataset_id {
                    assert!(node.children.is_empty(), "leaf {} has children", node.name);
                    out.push(dataset_path(id).unwrap().to_string());
                }
                collect_leaves(&node.children, out);
            }
        }

        let mut leaves = Vec::new();
        collect_leaves(&tree, &mut leaves);
        assert_eq!(
            leaves,
            vec![
                "Economy/Agriculture/Land Use/Arable",
                "Economy/Agriculture/Livestock",
                "Infrastructure/Education",
            ]
        );
    }

    #[test]
    fn test_interior_leaf_keeps_children_when_path_extends() {
        // A path that ends where another continues: the shared node is both
        // a leaf (dataset) and a parent.
        let tree = build_tree(&paths(&["A/B", "A/B/C"]));
        let b = &tree[0].children[0];
        assert_eq!(b.dataset_id.as_deref(), Some("ds:A/B"));
        assert_eq!(b.children.len(), 1);
        assert_eq!(b.children[0].dataset_id.as_deref(), Some("ds:A/B/C"));
    }

    #[test]
    fn test_dataset_id_for_path_normalizes() {
        assert_eq!(
            dataset_id_for_path(" A / B "),
            Some("ds:A/B".to_string())
        );
        assert_eq!(dataset_id_for_path(" // "), None);
    }
}
