pub mod commit;
pub mod event;
pub mod mapping;

/// Name of the upstream branch carrying the exported changes of a source pull request.
///
/// Repeated syncs of the same pull request reuse (and overwrite) this branch.
pub fn export_branch_name(source_pr: &str) -> String {
    format!("servo_export_{}", source_pr)
}
