use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Duración máxima de una alerta
pub const DURACION_ALARMA: Duration = Duration::from_millis(5000);

/// Cada cuánto emite un pulso y revisa la señal de interrupción
pub const INTERVALO_SONDEO: Duration = Duration::from_millis(100);

/// Destino de los pulsos de alerta. La implementación por defecto suena
/// por consola; las pruebas inyectan un contador.
pub trait AlertaSonora: Send + Sync {
    fn pulso(&self);
}

/// Campana de consola (BEL) con aviso en el log
pub struct BeepConsola;

impl AlertaSonora for BeepConsola {
    fn pulso(&self) {
        print!("\x07");
        println!("[ALERTA AUDITIVA] BEEP!");
    }
}

struct AlarmState {
    activa: Mutex<bool>,
    interrumpir: AtomicBool,
}

/// Alarma con rebote: como mucho una ejecución de alerta viva a la vez.
///
/// `activar` lanza un hilo propio que emite pulsos hasta agotar la
/// duración o hasta observar la señal de `detener`; mientras tanto las
/// llamadas repetidas a `activar` son no-ops baratas. `detener` en
/// reposo también es un no-op.
pub struct AlarmScheduler {
    estado: Arc<AlarmState>,
    duracion: Duration,
    sondeo: Duration,
    sirena: Arc<dyn AlertaSonora>,
}

impl AlarmScheduler {
    pub fn new() -> Self {
        Self::con_parametros(DURACION_ALARMA, INTERVALO_SONDEO, Arc::new(BeepConsola))
    }

    pub fn con_parametros(
        duracion: Duration,
        sondeo: Duration,
        sirena: Arc<dyn AlertaSonora>,
    ) -> Self {
        Self {
            estado: Arc::new(AlarmState {
                activa: Mutex::new(false),
                interrumpir: AtomicBool::new(false),
            }),
            duracion,
            sondeo,
            sirena,
        }
    }

    /// Dispara la alerta SOLO si no hay otra sonando
    pub fn activar(&self) {
        let mut activa = self.estado.activa.lock().unwrap();
        if *activa {
            return;
        }
        *activa = true;
        self.estado.interrumpir.store(false, Ordering::SeqCst);
        drop(activa);

        let estado = Arc::clone(&self.estado);
        let sirena = Arc::clone(&self.sirena);
        let duracion = self.duracion;
        let sondeo = self.sondeo;

        thread::spawn(move || {
            let fin = Instant::now() + duracion;
            while Instant::now() < fin && !estado.interrumpir.load(Ordering::SeqCst) {
                sirena.pulso();
                thread::sleep(sondeo);
            }
            *estado.activa.lock().unwrap() = false;
        });
    }

    /// Pide al hilo de la alerta que pare; lo observa a más tardar en el
    /// siguiente sondeo. Sin alerta activa no hace nada.
    pub fn detener(&self) {
        let activa = self.estado.activa.lock().unwrap();
        if *activa {
            self.estado.interrumpir.store(true, Ordering::SeqCst);
        }
    }

    pub fn esta_activa(&self) -> bool {
        *self.estado.activa.lock().unwrap()
    }
}

impl Default for AlarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}
