use super::defines;
use super::handle;
use super::render_data;

use anyhow::Result;
use vulkanalia::prelude::v1_0::*;

pub unsafe fn create_sync_objects(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let semaphore_info = vk::SemaphoreCreateInfo::builder();
    let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

    for _ in 0..defines::MAX_QUEUED_DRAWS {
        data.image_available_semaphores.push(device.create_semaphore(&semaphore_info, None)?);
        data.render_finished_semaphores.push(device.create_semaphore(&semaphore_info, None)?);
        data.in_flight_fences.push(device.create_fence(&fence_info, None)?);
    }

    Ok(())
}

pub unsafe fn destroy_sync_objects(device: &Device, data: &mut render_data::Data) {
    handle::take_all(&mut data.in_flight_fences).into_iter().for_each(|f| device.destroy_fence(f, None));
    handle::take_all(&mut data.render_finished_semaphores).into_iter().for_each(|s| device.destroy_semaphore(s, None));
    handle::take_all(&mut data.image_available_semaphores).into_iter().for_each(|s| device.destroy_semaphore(s, None));
}

/// The frame slot, rotated once per draw. Unrelated to the swapchain image index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter {
    slot: usize,
}

impl FrameCounter {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn advance(&mut self) {
        self.slot = (self.slot + 1) % defines::MAX_QUEUED_DRAWS;
    }
}

/// Which slot fence last rendered into each swapchain image.
#[derive(Clone, Debug, Default)]
pub struct ImageFences {
    fences: Vec<vk::Fence>,
}

impl ImageFences {
    pub fn new(image_count: usize) -> Self {
        Self { fences: vec![vk::Fence::null(); image_count] }
    }

    /// Records `slot_fence` as the owner of `image_index` and returns the
    /// previous owner if the caller still has to wait on it.
    ///
    /// The current slot fence was reset before acquisition, so it is never
    /// returned.
    pub fn claim(&mut self, image_index: usize, slot_fence: vk::Fence) -> Option<vk::Fence> {
        let previous = std::mem::replace(&mut self.fences[image_index], slot_fence);
        Some(previous).filter(|f| !f.is_null() && *f != slot_fence)
    }

    pub fn clear(&mut self) {
        self.fences.iter_mut().for_each(|f| *f = vk::Fence::null());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_rotation_is_periodic() {
        let mut counter = FrameCounter::default();
        assert_eq!(counter.slot(), 0);

        counter.advance();
        let after_one = counter.slot();

        for _ in 0..defines::MAX_QUEUED_DRAWS {
            counter.advance();
        }

        assert_eq!(counter.slot(), after_one);
        assert!(counter.slot() < defines::MAX_QUEUED_DRAWS);
    }

    #[test]
    fn first_use_of_an_image_needs_no_wait() {
        let mut fences = ImageFences::new(3);

        assert_eq!(fences.claim(1, vk::Fence::from_raw(10)), None);
    }

    #[test]
    fn image_owned_by_another_slot_is_waited_on() {
        let (slot_a, slot_b) = (vk::Fence::from_raw(10), vk::Fence::from_raw(20));
        let mut fences = ImageFences::new(3);

        fences.claim(0, slot_a);

        assert_eq!(fences.claim(0, slot_b), Some(slot_a));
        assert_eq!(fences.claim(0, slot_a), Some(slot_b));
    }

    #[test]
    fn current_slot_fence_is_never_returned() {
        let slot_a = vk::Fence::from_raw(10);
        let mut fences = ImageFences::new(2);

        fences.claim(1, slot_a);

        assert_eq!(fences.claim(1, slot_a), None);
    }

    #[test]
    fn cleared_table_forgets_owners() {
        let mut fences = ImageFences::new(2);
        fences.claim(0, vk::Fence::from_raw(10));

        fences.clear();

        assert_eq!(fences.claim(0, vk::Fence::from_raw(20)), None);
    }
}
