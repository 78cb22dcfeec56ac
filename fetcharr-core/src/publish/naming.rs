//! §4.H / §9 open question 2 (naming half): the on-disk filename Kodi
//! expects for each asset type, resolved against a per-item slot index for
//! multi-slot types (`fanart.jpg`, `fanart1.jpg`, `fanart2.jpg`, ...).

use fetcharr_model::AssetType;

pub fn filename_for(asset_type: AssetType, slot: usize, ext: &str) -> String {
    let stem = match asset_type {
        AssetType::Poster => "poster",
        AssetType::Fanart => "fanart",
        AssetType::Banner => "banner",
        AssetType::ClearArt => "clearart",
        AssetType::ClearLogo => "clearlogo",
        AssetType::Landscape => "landscape",
        AssetType::Thumb => "thumb",
        AssetType::Trailer => "trailer",
        AssetType::Subtitle => "subtitle",
    };

    if asset_type.is_multi_slot() && slot > 0 {
        format!("{stem}{slot}.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fanart_slot_has_no_numeric_suffix() {
        assert_eq!(filename_for(AssetType::Fanart, 0, "jpg"), "fanart.jpg");
        assert_eq!(filename_for(AssetType::Fanart, 1, "jpg"), "fanart1.jpg");
    }

    #[test]
    fn single_slot_types_ignore_slot_index() {
        assert_eq!(filename_for(AssetType::Poster, 3, "jpg"), "poster.jpg");
    }
}
