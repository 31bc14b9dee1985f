//! The `seotag delete` command: remove a stored upload.

use clap::Args;
use seotag_core::{Config, ImageStore, StoreError};

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// File name of the stored upload (as printed by `seotag tag`)
    #[arg(required = true)]
    pub name: String,
}

/// Execute the delete command.
///
/// A file that is already gone is reported, not treated as a failure.
pub async fn execute(args: DeleteArgs, config: &Config) -> anyhow::Result<()> {
    let store = ImageStore::new(config.upload_dir());
    println!("{}", delete_upload(&store, &args.name)?);
    Ok(())
}

fn delete_upload(store: &ImageStore, name: &str) -> anyhow::Result<String> {
    let path = store.path_for(name)?;

    match store.delete(&path) {
        Ok(()) => Ok(format!("Deleted: {}", path.display())),
        Err(StoreError::NotFound(_)) => {
            tracing::debug!("Nothing to delete at {:?}", path);
            Ok("File not found. It might have already been deleted.".to_string())
        }
        Err(e) => Err(e.into()),
    }
}
