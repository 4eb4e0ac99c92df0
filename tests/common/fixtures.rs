use storypath::tracker::ProgressTracker;
use storypath::workflow::Workflow;

/// Three steps across two sections: s1, s2 | s3.
pub fn story_workflow() -> Workflow {
    Workflow::builder("story_builder", "Build a Story")
        .section("setup", "Story Setup")
        .step("s1", "Meet your hero", "agent_hero")
        .step("s2", "Pick a setting", "agent_setting")
        .section("adventure", "The Adventure")
        .step("s3", "Face the challenge", "agent_challenge")
        .build()
}

pub fn story_tracker() -> ProgressTracker {
    ProgressTracker::new(story_workflow())
}
