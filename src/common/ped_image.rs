use image::{DynamicImage, RgbImage};

/// A frame handed to the detector, together with the classes the caller cares about.
#[derive(Debug, Clone, Default)]
pub struct PedImage {
    pub image: RgbImage,
    pub img_width: u32,
    pub img_height: u32,
    pub wanted_labels: Option<Vec<u16>>,
}

impl std::ops::Deref for PedImage {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl std::ops::DerefMut for PedImage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.image
    }
}

impl From<DynamicImage> for PedImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image.to_rgb8(), None)
    }
}

impl From<RgbImage> for PedImage {
    fn from(image: RgbImage) -> Self {
        Self::new(image, None)
    }
}

impl From<PedImage> for RgbImage {
    fn from(image: PedImage) -> Self {
        image.into_rgb8()
    }
}

impl PedImage {
    pub fn new(image: RgbImage, label_filters: Option<Vec<u16>>) -> Self {
        let (img_width, img_height) = image.dimensions();
        Self {
            image,
            img_width,
            img_height,
            wanted_labels: label_filters,
        }
    }

    /// Restricts the frame to persons only.
    pub fn persons_only(image: RgbImage) -> Self {
        Self::new(image, Some(vec![0]))
    }

    /// With no filter every class is wanted.
    pub fn is_label_wanted(&self, comp_id: u16) -> bool {
        match &self.wanted_labels {
            Some(masks) => masks.contains(&comp_id),
            None => true,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn into_rgb8(self) -> RgbImage {
        self.image
    }
}
