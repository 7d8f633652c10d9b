use crate::foundation::rational::Rational;

/// Pixel format of cached artifacts.
///
/// The format is opaque to the cache logic except for two things: it is part
/// of the cache identity, and it selects the on-disk container.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PixelFormat {
    /// Unset; parameters carrying this format cannot render.
    #[default]
    Invalid,
    /// 8-bit integer RGBA.
    Rgba8,
    /// 16-bit integer RGBA.
    Rgba16U,
    /// 16-bit float RGBA.
    Rgba16F,
    /// 32-bit float RGBA.
    Rgba32F,
}

impl PixelFormat {
    /// True for any concrete format.
    pub fn is_valid(self) -> bool {
        self != PixelFormat::Invalid
    }

    /// Artifact file extension. Integer formats decode very slowly from EXR,
    /// so they are stored as TIFF instead.
    pub fn cache_ext(self) -> &'static str {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Rgba16U => "tiff",
            PixelFormat::Invalid | PixelFormat::Rgba16F | PixelFormat::Rgba32F => "exr",
        }
    }
}

/// Render configuration for one viewer: output geometry, format, preview
/// divider, and the timebase defining discrete frame boundaries.
///
/// These values are folded into the cache identity; changing any of them
/// invalidates every cached frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoParams {
    /// Full output width in pixels.
    pub width: u32,
    /// Full output height in pixels.
    pub height: u32,
    /// Preview divider; effective dimensions are `width / divider`.
    pub divider: u32,
    /// Pixel format of rendered artifacts.
    pub format: PixelFormat,
    /// Duration of one frame on the rational time axis.
    pub timebase: Rational,
}

impl VideoParams {
    /// Construct parameters with a divider of 1.
    pub fn new(width: u32, height: u32, format: PixelFormat, timebase: Rational) -> VideoParams {
        VideoParams {
            width,
            height,
            divider: 1,
            format,
            timebase,
        }
    }

    /// Width actually rendered at the current divider.
    pub fn effective_width(&self) -> u32 {
        self.width / self.divider.max(1)
    }

    /// Height actually rendered at the current divider.
    pub fn effective_height(&self) -> u32 {
        self.height / self.divider.max(1)
    }

    /// False for zero dimensions, zero divider, an unset format, or a
    /// non-positive timebase. Invalid parameters turn all scheduling
    /// operations into no-ops.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.divider > 0
            && self.format.is_valid()
            && self.timebase > Rational::ZERO
    }
}

/// What a worker does with each job: digest upstream state into a hash,
/// render pixels, and/or persist the artifact to the disk cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperatingMode {
    /// Compute the content hash.
    pub hash: bool,
    /// Produce the frame.
    pub render: bool,
    /// Persist the artifact to disk.
    pub download: bool,
}

impl OperatingMode {
    /// Hash-only pass: populate the time→hash index without rendering.
    pub const HASH_ONLY: OperatingMode = OperatingMode {
        hash: true,
        render: false,
        download: false,
    };

    /// Render and hash, but keep results in memory only.
    pub const RENDER_AND_HASH: OperatingMode = OperatingMode {
        hash: true,
        render: true,
        download: false,
    };

    /// Hash, render, and persist: the normal preview-cache mode.
    pub const FULL: OperatingMode = OperatingMode {
        hash: true,
        render: true,
        download: true,
    };

    /// Whether jobs compute content hashes.
    pub fn hashes(self) -> bool {
        self.hash
    }

    /// Whether jobs produce frames.
    pub fn renders(self) -> bool {
        self.render
    }

    /// Whether jobs persist artifacts.
    pub fn downloads(self) -> bool {
        self.download
    }
}

impl Default for OperatingMode {
    fn default() -> Self {
        OperatingMode::FULL
    }
}
