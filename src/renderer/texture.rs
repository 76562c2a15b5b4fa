use super::defines;
use super::descriptor;
use super::error::RendererError;
use super::handle;
use super::image::{self, AllocatedImage};
use super::render_data;

use anyhow::{anyhow, Result};
use log::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use vulkanalia::prelude::v1_0::*;

/// Tightly packed RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Pixels {
    pub fn white() -> Self {
        Self { width: 1, height: 1, rgba: vec![255; 4] }
    }
}

/// Widens 8-bit grey, grey+alpha and RGB samples to RGBA.
pub fn to_rgba8(color_type: png::ColorType, samples: &[u8]) -> Result<Vec<u8>> {
    let rgba = match color_type {
        png::ColorType::Rgba => samples.to_vec(),
        png::ColorType::Rgb => samples.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => samples.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        png::ColorType::Grayscale => samples.iter().flat_map(|g| [*g, *g, *g, 255]).collect(),
        png::ColorType::Indexed => return Err(anyhow!("palette was not expanded")),
    };

    Ok(rgba)
}

pub fn decode_png(reader: impl Read) -> Result<Pixels> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;
    let mut samples = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut samples)?;

    let rgba = to_rgba8(info.color_type, &samples[..info.buffer_size()])?;

    Ok(Pixels { width: info.width, height: info.height, rgba })
}

pub fn load_png(path: &Path) -> Result<Pixels> {
    let texture_error = |e: &dyn std::fmt::Display| RendererError::TextureLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::open(path).map_err(|e| texture_error(&e))?;
    let pixels = decode_png(BufReader::new(file)).map_err(|e| texture_error(&e))?;

    debug!("Decoded texture `{}` ({}x{}).", path.display(), pixels.width, pixels.height);

    Ok(pixels)
}

/// A sampled image and the set 1 descriptor set that binds it.
#[derive(Copy, Clone, Debug, Default)]
pub struct Texture {
    pub image: AllocatedImage,
    pub sampler: vk::Sampler,
    pub descriptor_set: vk::DescriptorSet,
}

impl Texture {
    pub unsafe fn new(instance: &Instance, device: &Device, data: &render_data::Data, pixels: &Pixels) -> Result<Self> {
        let mut texture = Texture::default();

        let result = (|| -> Result<()> {
            texture.image = image::upload_sampled_image(
                instance,
                device,
                data.transfer(),
                &pixels.rgba,
                pixels.width,
                pixels.height,
                defines::TEXTURE_FORMAT,
            )?;

            texture.sampler = create_sampler(instance, device, data.physical_device)?;
            texture.descriptor_set = descriptor::create_texture_set(device, data, texture.image.view, texture.sampler)?;

            Ok(())
        })();

        match result {
            Ok(()) => Ok(texture),
            Err(e) => {
                texture.destroy(device);
                Err(e)
            }
        }
    }

    /// The descriptor set is returned with its pool.
    pub unsafe fn destroy(&mut self, device: &Device) {
        self.descriptor_set = vk::DescriptorSet::null();

        if let Some(sampler) = handle::take(&mut self.sampler) {
            device.destroy_sampler(sampler, None);
        }
        self.image.destroy(device);
    }
}

unsafe fn create_sampler(instance: &Instance, device: &Device, physical_device: vk::PhysicalDevice) -> Result<vk::Sampler> {
    let limits = instance.get_physical_device_properties(physical_device).limits;

    let info = vk::SamplerCreateInfo::builder()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(limits.max_sampler_anisotropy.min(16.0))
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .min_lod(0.0)
        .max_lod(0.0)
        .mip_lod_bias(0.0);

    Ok(device.create_sampler(&info, None)?)
}

/// Append-only texture storage. Ids are positions and stay valid until teardown.
#[derive(Clone, Debug, Default)]
pub struct TextureRegistry {
    textures: Vec<Texture>,
    by_name: HashMap<String, usize>,
}

impl TextureRegistry {
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Fails if another texture would not fit.
    pub fn ensure_capacity(&self) -> Result<()> {
        if self.len() >= defines::MAX_TEXTURES {
            return Err(anyhow!(RendererError::TextureRegistryFull { capacity: defines::MAX_TEXTURES }));
        }

        Ok(())
    }

    pub fn push(&mut self, texture: Texture) -> Result<usize> {
        self.ensure_capacity()?;
        self.textures.push(texture);
        Ok(self.len() - 1)
    }

    /// Registers `texture` under a file name so later materials reuse it.
    pub fn push_named(&mut self, name: &str, texture: Texture) -> Result<usize> {
        let id = self.push(texture)?;
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Unknown ids fall back to the white texture.
    pub fn descriptor_set(&self, id: usize) -> vk::DescriptorSet {
        self.textures
            .get(id)
            .or_else(|| self.textures.get(defines::FALLBACK_TEXTURE_ID))
            .map(|t| t.descriptor_set)
            .unwrap_or_default()
    }

    pub unsafe fn destroy(&mut self, device: &Device) {
        self.textures.iter_mut().for_each(|t| t.destroy(device));
        self.textures.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, color_type: png::ColorType, depth: png::BitDepth, samples: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, width, height);
            encoder.set_color(color_type);
            encoder.set_depth(depth);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(samples).unwrap();
        }
        bytes
    }

    #[test]
    fn rgb_gets_an_opaque_alpha() {
        let rgba = to_rgba8(png::ColorType::Rgb, &[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn grey_is_replicated_across_channels() {
        assert_eq!(to_rgba8(png::ColorType::Grayscale, &[9]).unwrap(), vec![9, 9, 9, 255]);
        assert_eq!(to_rgba8(png::ColorType::GrayscaleAlpha, &[9, 7]).unwrap(), vec![9, 9, 9, 7]);
    }

    #[test]
    fn unexpanded_palette_is_rejected() {
        assert!(to_rgba8(png::ColorType::Indexed, &[0]).is_err());
    }

    #[test]
    fn sixteen_bit_grey_png_decodes_to_rgba8() {
        let png = encode(2, 1, png::ColorType::Grayscale, png::BitDepth::Sixteen, &[0xff, 0x00, 0x10, 0x00]);

        let pixels = decode_png(png.as_slice()).unwrap();

        assert_eq!((pixels.width, pixels.height), (2, 1));
        assert_eq!(pixels.rgba, vec![0xff, 0xff, 0xff, 255, 0x10, 0x10, 0x10, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_png(&b"not a png"[..]).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = load_png(Path::new("does/not/exist.png")).unwrap_err();

        let error = error.downcast_ref::<RendererError>().unwrap();
        assert!(matches!(error, RendererError::TextureLoad { .. }));
        assert!(error.to_string().contains("exist.png"));
    }

    #[test]
    fn registry_hands_out_sequential_ids() {
        let mut registry = TextureRegistry::default();

        assert_eq!(registry.push(Texture::default()).unwrap(), 0);
        assert_eq!(registry.push_named("brick.png", Texture::default()).unwrap(), 1);
        assert_eq!(registry.find("brick.png"), Some(1));
        assert_eq!(registry.find("stone.png"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_refuses_past_capacity() {
        let mut registry = TextureRegistry::default();
        for _ in 0..defines::MAX_TEXTURES {
            registry.push(Texture::default()).unwrap();
        }

        let error = registry.push(Texture::default()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RendererError>(),
            Some(RendererError::TextureRegistryFull { .. })
        ));
        assert_eq!(registry.len(), defines::MAX_TEXTURES);
    }

    #[test]
    fn unknown_ids_use_the_fallback_set() {
        let mut registry = TextureRegistry::default();
        let fallback = Texture { descriptor_set: vk::DescriptorSet::from_raw(7), ..Default::default() };
        registry.push(fallback).unwrap();

        assert_eq!(registry.descriptor_set(0), vk::DescriptorSet::from_raw(7));
        assert_eq!(registry.descriptor_set(12), vk::DescriptorSet::from_raw(7));
    }
}
