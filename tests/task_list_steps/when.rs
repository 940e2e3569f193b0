//! When steps for task list BDD scenarios.

use std::sync::Arc;

use super::world::{TaskListWorld, run_async, task_id};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskdeck::task::domain::{UploadFile, UploadProgress};

#[when("the task list is fetched")]
fn fetch_list(world: &mut TaskListWorld) {
    world.last_outcome = Some(run_async(world.controller.fetch()));
}

#[when("the user adds a blank task")]
fn add_blank_task(world: &mut TaskListWorld) {
    world.last_outcome = Some(run_async(world.controller.add_task("   ")));
}

#[when(r#"the user adds a task with content "{content}""#)]
fn add_task(world: &mut TaskListWorld, content: String) {
    world.last_outcome = Some(run_async(world.controller.add_task(&content)));
}

#[when(r#"the user deletes task "{id}""#)]
fn delete_task(world: &mut TaskListWorld, id: String) -> Result<(), eyre::Report> {
    let target = task_id(&id)?;
    world.last_outcome = Some(run_async(world.controller.delete_task(&target)));
    Ok(())
}

#[when(r#"the user toggles task "{id}""#)]
fn toggle_task(world: &mut TaskListWorld, id: String) -> Result<(), eyre::Report> {
    let target = task_id(&id)?;
    let completed = world
        .controller
        .task(&target)
        .map(|task| task.completed())
        .ok_or_else(|| eyre::eyre!("task {id} is not listed"))?;
    world.last_outcome = Some(run_async(
        world.controller.toggle_complete(&target, completed),
    ));
    Ok(())
}

#[when(r#"the user attaches a {size:u64} byte file "{name}" to task "{id}""#)]
fn attach_file(
    world: &mut TaskListWorld,
    size: u64,
    name: String,
    id: String,
) -> Result<(), eyre::Report> {
    let target = task_id(&id)?;
    let len = usize::try_from(size).wrap_err("file size fits in memory")?;
    let file = UploadFile::new(name, "application/pdf", vec![b'x'; len])
        .wrap_err("build upload file")?;
    let progress = Arc::clone(&world.progress);
    let observer = move |value: UploadProgress| progress.lock().push(value);
    world.last_outcome = Some(run_async(world.controller.attach(&target, &file, observer)));
    Ok(())
}
