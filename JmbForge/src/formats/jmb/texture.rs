//! Texture section replacement

use std::fs;
use std::path::Path;

use super::DDS_MAGIC;
use super::types::{JmbFile, TextureHeader};
use crate::error::{Error, Result};
use crate::texture::TextureCodec;

impl JmbFile {
    /// Swap in a new texture payload.
    ///
    /// The payload must start with the DDS marker and describe an image whose
    /// sides are multiples of 4. Only the texture header is updated here; the
    /// offsets that follow are fixed by the next [`JmbFile::recompute_layout`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidTextureMagic`], [`Error::TextureDimensionsNotAligned`],
    /// [`Error::TextureTooLarge`], or the codec's error if the dimensions cannot be read.
    pub fn replace_texture<C: TextureCodec + ?Sized>(
        &mut self,
        payload: Vec<u8>,
        codec: &C,
    ) -> Result<()> {
        let mut magic = [0u8; 4];
        let head = payload.get(..4).unwrap_or(&payload[..]);
        magic[..head.len()].copy_from_slice(head);
        if magic != DDS_MAGIC {
            return Err(Error::InvalidTextureMagic(magic));
        }

        let (width, height) = codec.dimensions(&payload)?;
        if width % 4 != 0 || height % 4 != 0 {
            return Err(Error::TextureDimensionsNotAligned { width, height });
        }

        let fitted = TextureHeader::for_payload(payload.len(), width, height)?;

        let header = &mut self.texture.header;
        let (old_w, old_h) = (header.width_blocks, header.height_blocks);
        let old_len = header.payload_len;
        header.width_blocks = fitted.width_blocks;
        header.height_blocks = fitted.height_blocks;
        header.payload_len = fitted.payload_len;
        tracing::info!(
            "texture blocks: {old_w}x{old_h} -> {}x{}, payload: {old_len} -> {} bytes",
            header.width_blocks,
            header.height_blocks,
            header.payload_len
        );

        self.texture.payload = payload;
        Ok(())
    }

    /// Read a DDS file from disk and [replace](JmbFile::replace_texture) the texture with it.
    ///
    /// # Errors
    /// See [`JmbFile::replace_texture`].
    pub fn reimport_texture<P: AsRef<Path>, C: TextureCodec + ?Sized>(
        &mut self,
        path: P,
        codec: &C,
    ) -> Result<()> {
        let payload = fs::read(path)?;
        self.replace_texture(payload, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::jmb::{GlyphRect, SentenceRecord, Texture, UsHeader, VariantHeader};
    use image::RgbaImage;

    struct FixedCodec(u32, u32);

    impl TextureCodec for FixedCodec {
        fn dimensions(&self, _blob: &[u8]) -> Result<(u32, u32)> {
            Ok((self.0, self.1))
        }

        fn encode(&self, _image: &RgbaImage) -> Result<Vec<u8>> {
            Ok(DDS_MAGIC.to_vec())
        }
    }

    fn file() -> JmbFile {
        JmbFile::assemble(
            VariantHeader::Us(UsHeader::default()),
            vec![SentenceRecord::empty_flat()],
            vec![GlyphRect::default()],
            Texture::new(b"DDS old".to_vec(), 4, 4).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_replace_texture_updates_header() {
        let mut jmb = file();
        jmb.replace_texture(b"DDS new payload".to_vec(), &FixedCodec(512, 64))
            .unwrap();
        assert_eq!(jmb.texture.header.width_blocks, 128);
        assert_eq!(jmb.texture.header.height_blocks, 16);
        assert_eq!(jmb.texture.header.payload_len, 15);
    }

    #[test]
    fn test_replace_texture_rejects_bad_magic() {
        let mut jmb = file();
        let err = jmb.replace_texture(b"PNG".to_vec(), &FixedCodec(4, 4)).unwrap_err();
        assert!(matches!(err, Error::InvalidTextureMagic([b'P', b'N', b'G', 0])));
    }

    #[test]
    fn test_replace_texture_rejects_unaligned() {
        let mut jmb = file();
        let err = jmb
            .replace_texture(b"DDS x".to_vec(), &FixedCodec(510, 64))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TextureDimensionsNotAligned { width: 510, height: 64 }
        ));
        assert_eq!(jmb.texture.payload, b"DDS old");
    }

    #[test]
    fn test_replace_texture_rejects_oversized() {
        let mut jmb = file();
        let before = jmb.texture.clone();
        let err = jmb
            .replace_texture(b"DDS huge".to_vec(), &FixedCodec(262_144, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TextureTooLarge { width: 262_144, height: 4, payload_len: 8 }
        ));
        assert_eq!(jmb.texture, before);

        // the largest width the header can describe
        jmb.replace_texture(b"DDS wide".to_vec(), &FixedCodec(262_140, 4))
            .unwrap();
        assert_eq!(jmb.texture.header.width_blocks, u16::MAX);
    }
}
