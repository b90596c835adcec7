// ─── Upstream sources ───
// release  : GitHub "latest release" of the mod manager
// package  : GameBanana per-item metadata + file download
// download : shared streaming body reader

pub mod download;
pub mod package;
pub mod release;

pub use download::{FetchedAsset, ItemRef, Upstream};
pub use package::{ClassifiedAsset, PackageFetcher, PackageFile, PackageMetadata};
pub use release::{select_asset, Release, ReleaseAsset, ReleaseFetcher};
