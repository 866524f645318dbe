//! Minimal wgpu init (no window). Verifies pointmorph-renderer compiles its kernels on this adapter.

fn main() {
    env_logger::init();
    pollster::block_on(async {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("No adapter");
        log::info!("adapter: {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .expect("No device");
        let _renderer = pointmorph_renderer::Renderer::new(device, queue).expect("Renderer::new");
        println!("PointMorph minimal_wgpu: OK");
    });
}
