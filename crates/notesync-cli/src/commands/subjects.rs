use notesync_core::Subject;

pub fn run_subjects() {
    for line in subject_lines() {
        println!("{line}");
    }
}

/// One line per subject: tag, label, icon and color class.
pub fn subject_lines() -> Vec<String> {
    Subject::ALL
        .iter()
        .map(|subject| {
            format!(
                "{:<14} {:<14} {:<14} {}",
                subject.tag(),
                subject.label(),
                subject.icon(),
                subject.color_class()
            )
        })
        .collect()
}
