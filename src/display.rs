//! Textual rendering of parsed worksheets and the derived workflow.
//!
//! Used by the `display` subcommand so a load can be inspected before any
//! server calls are made.

use petgraph::stable_graph::NodeIndex;

use crate::sheet::model::{Attribute, Worksheet};
use crate::workflow::WorkflowGraph;

fn spaces(count: usize) -> String {
    " ".repeat(count)
}

fn render_attr(out: &mut String, indent: usize, attr: &Attribute) {
    let unit = if attr.unit.is_empty() {
        "(No units given)".to_string()
    } else {
        format!("({})", attr.unit)
    };
    match &attr.value {
        Some(value) => out.push_str(&format!(
            "{}{}: {} {}\n",
            spaces(indent),
            attr.name,
            value.json_value(),
            unit
        )),
        None => out.push_str(&format!(
            "{}{}: No value given {}\n",
            spaces(indent),
            attr.name,
            unit
        )),
    }
}

/// Render each worksheet's process attributes, samples and files.
pub fn render_worksheets(worksheets: &[Worksheet]) -> String {
    let mut out = String::new();
    for worksheet in worksheets {
        out.push_str(&format!("Worksheet {}\n", worksheet.name));

        out.push_str(&format!("{}Process Attributes:\n", spaces(4)));
        for sample in &worksheet.samples {
            out.push_str(&format!(
                "{}Associated with sample {}\n",
                spaces(6),
                sample.name
            ));
            for attr in &sample.process_attrs {
                render_attr(&mut out, 8, attr);
            }
            if !sample.files.is_empty() {
                out.push_str(&format!("{}Files associated with process:\n", spaces(6)));
                for file in &sample.files {
                    out.push_str(&format!("{}{}\n", spaces(8), file.path));
                }
            }
        }

        out.push_str(&format!("{}Samples:\n", spaces(4)));
        for sample in &worksheet.samples {
            out.push_str(&format!("{}{}\n", spaces(6), sample.name));
            out.push_str(&format!("{}Attributes:\n", spaces(8)));
            for attr in &sample.attributes {
                render_attr(&mut out, 10, attr);
            }
            if !sample.files.is_empty() {
                out.push_str(&format!("{}Files:\n", spaces(8)));
                for file in &sample.files {
                    out.push_str(&format!("{}{}\n", spaces(10), file.path));
                }
            }
        }
    }
    out
}

/// Render the workflow as a step tree from each creation root.
pub fn render_workflow(workflow: &WorkflowGraph) -> String {
    let mut out = String::new();
    out.push_str("======= workflow =======\n");
    out.push_str("Create samples:\n");
    for &root in &workflow.roots {
        if let crate::workflow::WorkflowNode::Root { sample } = workflow.node(root) {
            out.push_str(&format!("{}Sample {}\n", spaces(2), sample.name));
        }
        render_steps(workflow, root, 4, &mut out);
    }
    out
}

fn render_steps(workflow: &WorkflowGraph, idx: NodeIndex, indent: usize, out: &mut String) {
    out.push_str(&format!("{}{}\n", spaces(indent), workflow.node(idx).label()));
    for child in workflow.children(idx) {
        render_steps(workflow, child, indent + 2, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::model::Sample;
    use crate::sheet::value::convert;
    use crate::workflow::build_workflow;

    fn worksheet() -> Worksheet {
        let mut worksheet = Worksheet::new("Heat", 1);
        let mut sample = Sample::new("S1", 2);
        sample.add_process_attribute(
            Attribute::new("Time", "s", 3).with_value(convert("300").unwrap()),
        );
        sample.add_attribute(Attribute::new("Grain", "mm", 4).with_value(convert("2").unwrap()));
        sample.add_file("data/run1.tif", 5);
        worksheet.add_sample(sample);
        worksheet
    }

    #[test]
    fn test_render_worksheets() {
        let rendered = render_worksheets(&[worksheet()]);
        assert!(rendered.contains("Worksheet Heat"));
        assert!(rendered.contains("Associated with sample S1"));
        assert!(rendered.contains("Time: 300 (s)"));
        assert!(rendered.contains("Grain: 2 (mm)"));
        assert!(rendered.contains("data/run1.tif"));
    }

    #[test]
    fn test_render_attr_without_unit_or_value() {
        let mut out = String::new();
        render_attr(&mut out, 0, &Attribute::new("Quadrant", "", 3));
        assert_eq!(out, "Quadrant: No value given (No units given)\n");
    }

    #[test]
    fn test_render_workflow_tree() {
        let wf = build_workflow(&[worksheet()], true);
        let rendered = render_workflow(&wf);
        assert!(rendered.contains("Create samples:"));
        assert!(rendered.contains("Sample S1"));
        assert!(rendered.contains("Create Sample"));
        assert!(rendered.contains("Heat"));
    }
}
