/// Three-channel linear RGB radiometric quantities (radiance, reflectance, throughput).
pub mod color;
